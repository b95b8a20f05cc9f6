/// 每個欄位各自遞增的請求編號；回應帶回的編號不是最新的就丟棄
#[derive(Debug, Default, Clone)]
pub struct RequestSequence {
    latest: u64,
}

impl RequestSequence {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next(&mut self) -> u64 {
        self.latest += 1;
        self.latest
    }

    pub fn is_latest(&self, ticket: u64) -> bool {
        ticket == self.latest
    }

    /// 讓所有已發出的請求失效（例如上層選擇改變時）
    pub fn invalidate(&mut self) {
        self.latest += 1;
    }
}
