// Domain layer: 資料模型與對外介面（ports），不依賴任何具體的 HTTP 或畫面實作

pub mod model;
pub mod ports;
