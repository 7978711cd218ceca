use crate::address::Address;
use crate::boc;
use crate::cell::CellRef;
use crate::error::Result;

/// A `ton://transfer/...` wallet deeplink under assembly.
///
/// The amount is a final nanoton value; no scaling happens here. The
/// `init` parameter appears only when a StateInit cell is attached, the
/// `bin` parameter only when a non-empty body cell is attached.
pub struct DeepLink {
    to: Address,
    amount: u128,
    bounceable: bool,
    testnet: bool,
    state_init: Option<CellRef>,
    body: Option<CellRef>,
}

impl DeepLink {
    /// Starts a link to `to` carrying `amount` nanotons. The destination
    /// renders non-bounceable by default, as wallet links conventionally
    /// do.
    pub fn new(to: Address, amount: u128) -> Self {
        DeepLink {
            to,
            amount,
            bounceable: false,
            testnet: false,
            state_init: None,
            body: None,
        }
    }

    /// Renders the destination address bounceable.
    pub fn bounceable(mut self, bounceable: bool) -> Self {
        self.bounceable = bounceable;
        self
    }

    /// Marks the destination address test-only.
    pub fn testnet(mut self, testnet: bool) -> Self {
        self.testnet = testnet;
        self
    }

    /// Attaches a StateInit cell (contract deployment).
    pub fn with_state_init(mut self, cell: CellRef) -> Self {
        self.state_init = Some(cell);
        self
    }

    /// Attaches a message body cell. An empty cell (no bits, no refs) is
    /// treated as no body.
    pub fn with_body(mut self, cell: CellRef) -> Self {
        if cell.bit_len() > 0 || !cell.refs().is_empty() {
            self.body = Some(cell);
        }
        self
    }

    /// Serializes the attachments and renders the URI.
    pub fn to_url(&self) -> Result<String> {
        let mut url = format!(
            "ton://transfer/{}?amount={}",
            self.to.to_string_with(self.bounceable, self.testnet),
            self.amount
        );
        if let Some(init) = &self.state_init {
            url.push_str("&init=");
            url.push_str(&boc::to_base64url(&boc::serialize(init)?));
        }
        if let Some(body) = &self.body {
            url.push_str("&bin=");
            url.push_str(&boc::to_base64url(&boc::serialize(body)?));
        }
        Ok(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::CellBuilder;

    fn destination() -> Address {
        Address::new(0, [7; 32])
    }

    #[test]
    fn plain_link_has_no_optional_params() {
        let url = DeepLink::new(destination(), 100_000_000).to_url().unwrap();
        assert!(url.starts_with("ton://transfer/"));
        assert!(url.contains("?amount=100000000"));
        assert!(!url.contains("&init="));
        assert!(!url.contains("&bin="));
    }

    #[test]
    fn body_appears_as_bin() {
        let body = CellBuilder::new().store_uint(3, 32).unwrap().build_ref();
        let url = DeepLink::new(destination(), 1)
            .with_body(body)
            .to_url()
            .unwrap();
        assert!(url.contains("&bin="));
    }

    #[test]
    fn empty_body_is_dropped() {
        let url = DeepLink::new(destination(), 1)
            .with_body(CellBuilder::new().build_ref())
            .to_url()
            .unwrap();
        assert!(!url.contains("&bin="));
    }

    #[test]
    fn state_init_appears_as_init() {
        let init = CellBuilder::new().store_uint(0b00110, 5).unwrap().build_ref();
        let url = DeepLink::new(destination(), 1)
            .with_state_init(init)
            .to_url()
            .unwrap();
        assert!(url.contains("&init="));
    }

    #[test]
    fn url_is_url_safe() {
        let body = CellBuilder::new()
            .store_bytes(&[0xfb, 0xff, 0xfe, 0x3f])
            .unwrap()
            .build_ref();
        let url = DeepLink::new(destination(), 42)
            .with_body(body)
            .to_url()
            .unwrap();
        let bin = url.split_once("&bin=").unwrap().1;
        assert!(!bin.is_empty());
        assert!(!bin.contains('+'));
        assert!(!bin.contains('/'));
        assert!(!bin.contains('='));
    }
}
