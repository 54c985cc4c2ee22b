use serde::{Deserialize, Serialize};

/// 宿主进程交给自动化入口的数据包
///
/// 三个文件数组按下标一一对应，长度应当相等。
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct PublishBundle {
    pub title: String,
    pub description: String,
    /// base64 编码的文件内容
    #[serde(default)]
    pub file_contents: Vec<String>,
    #[serde(default)]
    pub file_names: Vec<String>,
    #[serde(default)]
    pub file_mimes: Vec<String>,
}

impl PublishBundle {
    pub fn file_count(&self) -> usize {
        self.file_contents.len()
    }

    /// 三个数组长度是否一致
    pub fn is_aligned(&self) -> bool {
        self.file_contents.len() == self.file_names.len()
            && self.file_names.len() == self.file_mimes.len()
    }
}

/// 解码后的文件
#[derive(Clone, PartialEq, Eq)]
pub struct MaterializedFile {
    pub name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl MaterializedFile {
    pub fn new(name: impl Into<String>, mime_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            bytes,
        }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl std::fmt::Debug for MaterializedFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MaterializedFile")
            .field("name", &self.name)
            .field("mime_type", &self.mime_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// 单次运行期间不变的发布内容
#[derive(Debug, Clone, Default)]
pub struct PublishPayload {
    pub title: String,
    pub description: String,
    pub files: Vec<MaterializedFile>,
}

impl PublishPayload {
    pub fn has_files(&self) -> bool {
        !self.files.is_empty()
    }
}
