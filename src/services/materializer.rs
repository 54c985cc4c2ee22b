//! 发布数据解码 - 业务能力层
//!
//! 把 base64 数据包还原成内存中的文件

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use tracing::{debug, warn};

use crate::error::PayloadError;
use crate::models::{MaterializedFile, PublishBundle, PublishPayload};

/// 每次解码的输入长度，必须是 4 的倍数
const DECODE_CHUNK: usize = 4096;

/// 分片解码 base64
///
/// 与 `atob` 一致，忽略所有空白（包括换行），再按 4 的倍数切片。
pub fn decode_base64(encoded: &str) -> Result<Vec<u8>, base64::DecodeError> {
    let encoded: Vec<u8> = encoded
        .bytes()
        .filter(|b| !b.is_ascii_whitespace())
        .collect();
    let mut bytes = Vec::with_capacity(encoded.len() / 4 * 3);
    for chunk in encoded.chunks(DECODE_CHUNK) {
        STANDARD.decode_vec(chunk, &mut bytes)?;
    }
    Ok(bytes)
}

/// 按下标对齐三个数组并解码
///
/// 某个文件解码失败时只记录日志并跳过它，其余文件照常返回，顺序不变。
pub fn materialize(bundle: &PublishBundle) -> Vec<MaterializedFile> {
    if !bundle.is_aligned() {
        warn!(
            "文件数组长度不一致: 内容 {} / 文件名 {} / 类型 {}，多出的条目将被忽略",
            bundle.file_contents.len(),
            bundle.file_names.len(),
            bundle.file_mimes.len()
        );
    }

    let entries = bundle
        .file_contents
        .iter()
        .zip(&bundle.file_names)
        .zip(&bundle.file_mimes);

    let mut files = Vec::with_capacity(bundle.file_count());
    for (index, ((content, name), mime)) in entries.enumerate() {
        match decode_base64(content) {
            Ok(bytes) => {
                debug!("解码文件 #{} {} ({} 字节)", index, name, bytes.len());
                files.push(MaterializedFile::new(name.as_str(), mime.as_str(), bytes));
            }
            Err(source) => {
                let err = PayloadError::DecodeFailed {
                    index,
                    name: name.clone(),
                    source,
                };
                warn!("{}，已跳过", err);
            }
        }
    }
    files
}

/// 数据包 → 本次运行使用的发布内容
pub fn into_payload(bundle: &PublishBundle) -> PublishPayload {
    PublishPayload {
        title: bundle.title.clone(),
        description: bundle.description.clone(),
        files: materialize(bundle),
    }
}
