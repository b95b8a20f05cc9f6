// Adapters layer: 對外部系統的具體實作（HTTP API、本地檔案、終端機畫面）

pub mod http;
pub mod storage;
pub mod terminal;
