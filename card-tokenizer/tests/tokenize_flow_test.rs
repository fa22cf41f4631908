//! Integration tests for the tokenization flow.
//!
//! Runs [`CardTokenizer`] against an in-memory gateway that decrypts the packed
//! card with the gateway private key and signs its answers, so every test walks
//! the full create/update/delete path without touching the network.

use std::sync::{LazyLock, Mutex};

use base64::Engine as _;
use card_tokenizer::{
    CardTokenizer, GatewayConfig, TokenizerError,
    crypto::{KeyMaterial, Packer},
    error::Result,
    models::{CardInput, RequestOptions},
    transport::{RequestContext, Transport, TransportResponse},
};
use openssl::{
    hash::MessageDigest,
    pkey::{PKey, Private},
    rsa::{Padding, Rsa},
    sign::Signer,
};
use serde_json::{Value, json};

static GATEWAY_KEY: LazyLock<PKey<Private>> =
    LazyLock::new(|| PKey::from_rsa(Rsa::generate(2048).expect("rsa keygen")).expect("pkey"));

/// PEM body without header and footer, as merchants receive it.
fn public_key_body() -> String {
    let pem = String::from_utf8(GATEWAY_KEY.public_key_to_pem().expect("pem")).expect("utf8");
    pem.lines().filter(|line| !line.starts_with("-----")).collect()
}

fn sign(message: &str) -> String {
    let mut signer = Signer::new(MessageDigest::sha256(), &*GATEWAY_KEY).expect("signer");
    signer.update(message.as_bytes()).expect("update");
    hex::encode(signer.sign_to_vec().expect("sign"))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Signature {
    Valid,
    Tampered,
    Missing,
}

#[derive(Debug, Clone)]
struct Recorded {
    url: String,
    headers: Vec<(String, String)>,
    body: Value,
}

/// Gateway double. Sessions and tokens are derived from the request id, so the
/// checkout side stays stateless under concurrent calls.
#[derive(Debug)]
struct FakeGateway {
    merchant_status: u16,
    checkout_status: u16,
    signature: Signature,
    expiration: &'static str,
    checkout_body: Option<Value>,
    sent: Mutex<Vec<Recorded>>,
    cards: Mutex<Vec<Value>>,
}

impl Default for FakeGateway {
    fn default() -> Self {
        Self {
            merchant_status: 200,
            checkout_status: 200,
            signature: Signature::Valid,
            expiration: "0928",
            checkout_body: None,
            sent: Mutex::default(),
            cards: Mutex::default(),
        }
    }
}

impl FakeGateway {
    fn sent(&self) -> Vec<Recorded> {
        self.sent.lock().expect("lock").clone()
    }

    fn cards(&self) -> Vec<Value> {
        self.cards.lock().expect("lock").clone()
    }

    fn merchant(&self, path: &str, body: &Value) -> (u16, Value) {
        let request_id = body["requestId"].as_str().unwrap_or_default();
        match path {
            "/deleteToken" => (
                self.merchant_status,
                json!({"token": body["token"], "requestId": request_id}),
            ),
            _ => (
                self.merchant_status,
                json!({"token": format!("T-{request_id}"), "session": format!("S-{request_id}")}),
            ),
        }
    }

    fn checkout(&self, headers: &[(String, String)], body: &Value) -> (u16, Value) {
        let session = body["session"].as_str().unwrap_or_default();
        let request_id = session.trim_start_matches("S-");
        let token_header = headers.iter().find(|(name, _)| name == "liszt-token");
        assert_eq!(token_header.map(|(_, v)| v.as_str()), Some(format!("T-{request_id}").as_str()));

        let card = self.unpack(body);
        let card_number = card["card"]["cardNumber"].as_str().unwrap_or_default().to_owned();
        let token =
            card["token"].as_str().map_or_else(|| format!("tok-{request_id}"), str::to_owned);
        self.cards.lock().expect("lock").push(card.clone());

        if let Some(reply) = &self.checkout_body {
            return (self.checkout_status, reply.clone());
        }

        let status = "SUCCESS";
        let signature = match self.signature {
            Signature::Valid => sign(&format!("status:{status},requestId:{request_id}")),
            Signature::Tampered => sign(&format!("status:FAILED,requestId:{request_id}")),
            Signature::Missing => String::new(),
        };

        (
            self.checkout_status,
            json!({
                "status": status,
                "_signature": signature,
                "result": {
                    "token": token,
                    "last_digits": &card_number[card_number.len() - 4..],
                    "bin": &card_number[..6],
                },
                "expiration_date": self.expiration,
                "cardHolder": card["card"]["cardHolder"],
                "nickname": card["card"]["nickname"],
                "brand": "Visa",
            }),
        )
    }

    fn unpack(&self, body: &Value) -> Value {
        let lk = base64::engine::general_purpose::STANDARD
            .decode(body["lk"].as_str().expect("lk"))
            .expect("lk is base64");
        let rsa = GATEWAY_KEY.rsa().expect("rsa");
        let mut buf = vec![0u8; rsa.size() as usize];
        let len = rsa.private_decrypt(&lk, &mut buf, Padding::PKCS1).expect("unwrap key");
        let key: KeyMaterial = serde_json::from_slice(&buf[..len]).expect("key material json");

        let card = Packer::unpack_card(body["ld"].as_str().expect("ld"), &key).expect("unpack");
        serde_json::from_str(&card).expect("card json")
    }
}

impl Transport for FakeGateway {
    async fn post<'a>(
        &'a self,
        ctx: RequestContext<'a>,
        body: &'a [u8],
    ) -> Result<TransportResponse> {
        let headers: Vec<(String, String)> =
            ctx.headers.iter().map(|(k, v)| ((*k).to_owned(), (*v).to_owned())).collect();
        let body: Value = serde_json::from_slice(body).expect("json body");
        self.sent.lock().expect("lock").push(Recorded {
            url: format!("{}{}", ctx.base_url, ctx.path),
            headers: headers.clone(),
            body: body.clone(),
        });

        let (status, reply) = if ctx.base_url.contains("checkout") {
            self.checkout(&headers, &body)
        } else {
            self.merchant(ctx.path, &body)
        };

        Ok(TransportResponse { status, body: serde_json::to_vec(&reply).expect("reply json") })
    }

    fn protocol_name(&self) -> &'static str {
        "fake"
    }
}

fn config() -> GatewayConfig {
    GatewayConfig::sandbox("MERCHANT-1", "SECRET-1", public_key_body())
}

fn tokenizer(gateway: FakeGateway) -> CardTokenizer<FakeGateway> {
    CardTokenizer::with_transport(config(), gateway).expect("valid configuration")
}

fn card() -> CardInput {
    CardInput {
        number: "4242424242424242".to_owned(),
        cvc: "123".to_owned(),
        name: "Jane Doe".to_owned(),
        nick: Some("daily".to_owned()),
        month: 9,
        year: 28,
    }
}

#[tokio::test]
async fn test_create_returns_literal_expiration() {
    let tokenizer = tokenizer(FakeGateway::default());

    let token = tokenizer
        .create(&card(), RequestOptions::with_request_id("req-a"))
        .await
        .expect("create should succeed");

    assert_eq!(token.token, "tok-req-a");
    assert_eq!(token.last4, "4242");
    assert_eq!(token.bin, "424242");
    assert_eq!(token.year, 9);
    assert_eq!(token.month, 28);
    assert_eq!(token.name.as_deref(), Some("Jane Doe"));
    assert_eq!(token.nick.as_deref(), Some("daily"));
    assert_eq!(token.brand.as_deref(), Some("Visa"));
    assert_eq!(token.request_id, "req-a");
}

#[tokio::test]
async fn test_create_wire_exchange() {
    let tokenizer = tokenizer(FakeGateway::default());

    tokenizer.create(&card(), RequestOptions::with_request_id("req-w")).await.expect("create");

    let gateway = fake(&tokenizer);
    let sent = gateway.sent();
    assert_eq!(sent.len(), 2);

    assert_eq!(sent[0].url, "https://sandbox-merchant.greenpay.me/tokenize");
    assert_eq!(
        sent[0].body,
        json!({"secret": "SECRET-1", "merchantId": "MERCHANT-1", "requestId": "req-w"})
    );
    assert!(sent[0].headers.is_empty());

    assert_eq!(sent[1].url, "https://sandbox-checkout.greenpay.me/tokenize");
    assert_eq!(sent[1].body["session"], "S-req-w");
    assert!(sent[1].body["ld"].as_str().expect("ld").chars().all(|c| c.is_ascii_hexdigit()));

    let cards = gateway.cards();
    assert_eq!(
        cards[0],
        json!({"card": {
            "cvc": "123",
            "nickname": "daily",
            "cardHolder": "Jane Doe",
            "cardNumber": "4242424242424242",
            "expirationDate": {"month": 9, "year": 28}
        }})
    );
}

#[tokio::test]
async fn test_update_uses_update_path_and_token() {
    let tokenizer = tokenizer(FakeGateway::default());

    let token = tokenizer
        .update("tok-existing", &card(), RequestOptions::with_request_id("req-u"))
        .await
        .expect("update should succeed");
    assert_eq!(token.token, "tok-existing");

    let gateway = fake(&tokenizer);
    let sent = gateway.sent();
    assert_eq!(sent[0].url, "https://sandbox-merchant.greenpay.me/tokenize/update");
    assert_eq!(sent[1].url, "https://sandbox-checkout.greenpay.me/tokenize/update");
    assert_eq!(sent[1].headers, vec![("liszt-token".to_owned(), "T-req-u".to_owned())]);
    assert_eq!(gateway.cards()[0]["token"], "tok-existing");
}

#[tokio::test]
async fn test_bad_signature_is_security_error() {
    let tokenizer =
        tokenizer(FakeGateway { signature: Signature::Tampered, ..FakeGateway::default() });

    let err = tokenizer
        .create(&card(), RequestOptions::default())
        .await
        .expect_err("tampered response must be rejected");

    assert!(err.is_security());
    assert!(!err.is_transport());
}

#[tokio::test]
async fn test_missing_signature_is_security_error() {
    let tokenizer =
        tokenizer(FakeGateway { signature: Signature::Missing, ..FakeGateway::default() });

    let result = tokenizer.create(&card(), RequestOptions::default()).await;
    assert!(matches!(result, Err(TokenizerError::SecurityError(_))));
}

#[tokio::test]
async fn test_unsigned_malformed_body_is_security_error() {
    for reply in [
        json!({"_signature": "00ff", "result": {"token": "tok"}}),
        json!({"_signature": null}),
        json!({"_signature": "00ff", "expiration_date": 928}),
    ] {
        let tokenizer =
            tokenizer(FakeGateway { checkout_body: Some(reply.clone()), ..FakeGateway::default() });

        let err = tokenizer
            .create(&card(), RequestOptions::default())
            .await
            .expect_err("unverified response must be rejected");

        assert!(err.is_security(), "{reply} gave {err:?}");
    }
}

#[tokio::test]
async fn test_order_failure_skips_checkout() {
    let tokenizer = tokenizer(FakeGateway { merchant_status: 500, ..FakeGateway::default() });

    let err = tokenizer.create(&card(), RequestOptions::default()).await.expect_err("must fail");

    assert!(err.is_transport());
    assert!(matches!(err, TokenizerError::RequestFailed { status: 500, .. }));
    assert_eq!(fake(&tokenizer).sent().len(), 1);
}

#[tokio::test]
async fn test_checkout_failure_is_transport_error() {
    let tokenizer = tokenizer(FakeGateway { checkout_status: 502, ..FakeGateway::default() });

    let err = tokenizer.create(&card(), RequestOptions::default()).await.expect_err("must fail");

    assert!(matches!(err, TokenizerError::RequestFailed { status: 502, .. }));
    assert_eq!(fake(&tokenizer).sent().len(), 2);
}

#[tokio::test]
async fn test_malformed_expiration_after_verification() {
    let tokenizer = tokenizer(FakeGateway { expiration: "09", ..FakeGateway::default() });

    let result = tokenizer.create(&card(), RequestOptions::default()).await;
    assert!(matches!(result, Err(TokenizerError::InvalidResponse(_))));
}

#[tokio::test]
async fn test_delete_with_supplied_request_id() {
    let tokenizer = tokenizer(FakeGateway::default());

    let deleted = tokenizer
        .delete("tok-1", RequestOptions::with_request_id("req-d"))
        .await
        .expect("delete should succeed");

    assert_eq!(deleted.token, "tok-1");
    assert_eq!(deleted.request_id, "req-d");

    let sent = fake(&tokenizer).sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].url, "https://sandbox-merchant.greenpay.me/deleteToken");
    assert_eq!(
        sent[0].body,
        json!({
            "token": "tok-1",
            "secret": "SECRET-1",
            "requestId": "req-d",
            "merchantId": "MERCHANT-1"
        })
    );
}

#[tokio::test]
async fn test_delete_generates_distinct_request_ids() {
    let tokenizer = tokenizer(FakeGateway::default());

    let first = tokenizer.delete("tok-1", RequestOptions::default()).await.expect("first");
    let second = tokenizer.delete("tok-1", RequestOptions::default()).await.expect("second");

    assert_ne!(first.request_id, second.request_id);
    assert!(uuid::Uuid::parse_str(&first.request_id).is_ok());
}

#[tokio::test]
async fn test_delete_failure_is_transport_error() {
    let tokenizer = tokenizer(FakeGateway { merchant_status: 404, ..FakeGateway::default() });

    let err = tokenizer.delete("tok-1", RequestOptions::default()).await.expect_err("must fail");
    assert!(matches!(
        err,
        TokenizerError::RequestFailed { ref endpoint, status: 404 } if endpoint == "/deleteToken"
    ));
}

#[tokio::test]
async fn test_concurrent_tokenize_calls_are_independent() {
    let tokenizer = tokenizer(FakeGateway::default());
    let card = card();

    let (a, b, c) = tokio::join!(
        tokenizer.create(&card, RequestOptions::with_request_id("req-1")),
        tokenizer.create(&card, RequestOptions::with_request_id("req-2")),
        tokenizer.update("tok-9", &card, RequestOptions::with_request_id("req-3")),
    );

    assert_eq!(a.expect("a").token, "tok-req-1");
    assert_eq!(b.expect("b").token, "tok-req-2");
    assert_eq!(c.expect("c").token, "tok-9");

    let wrapped_keys: Vec<Value> = fake(&tokenizer)
        .sent()
        .into_iter()
        .filter(|r| r.url.starts_with("https://sandbox-checkout"))
        .map(|r| r.body["lk"].clone())
        .collect();
    assert_eq!(wrapped_keys.len(), 3);
    assert_ne!(wrapped_keys[0], wrapped_keys[1]);
}

#[test]
fn test_invalid_public_key_fails_construction() {
    let config = GatewayConfig::sandbox("MERCHANT-1", "SECRET-1", "abc123");

    let err = CardTokenizer::with_transport(config, FakeGateway::default())
        .expect_err("construction must fail");
    assert!(matches!(err, TokenizerError::ConfigurationError(_)));
}

#[test]
fn test_config_from_toml_builds_tokenizer() {
    let toml = format!(
        r#"
            merchant = "MERCHANT-1"
            secret = "SECRET-1"
            public_key = "{}"

            [http]
            timeout_secs = 15
        "#,
        public_key_body()
    );

    let config = GatewayConfig::from_toml(&toml).expect("valid TOML");
    let tokenizer =
        CardTokenizer::with_transport(config, FakeGateway::default()).expect("tokenizer");
    assert_eq!(tokenizer.config().http.timeout_secs, 15);
}

fn fake(tokenizer: &CardTokenizer<FakeGateway>) -> &FakeGateway {
    tokenizer.transport()
}
