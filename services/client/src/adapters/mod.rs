pub mod download;
pub mod http;
pub mod storage;

pub use download::FsDownloads;
pub use http::ReqwestHttpClient;
pub use storage::FileKeyValueStore;
