use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::response::{IntoResponse, Response};
use axum::{Router, extract::State, http::StatusCode, routing::post};
use enterprise_pay::outbound::wechat_pay::{SIGN_FIELD, SignType, parse_envelope, sign};
use tokio::net::TcpListener;

/// Signing key the mock provider verifies against
pub const MERCHANT_KEY: &str = "K";

#[derive(Clone, Default)]
pub struct MockProvider {
    received: Arc<Mutex<Vec<BTreeMap<String, String>>>>,
}

impl MockProvider {
    pub fn received(&self) -> Vec<BTreeMap<String, String>> {
        self.received.lock().unwrap().clone()
    }
}

/// Start a mock disbursement endpoint and return its URL.
///
/// The partner trade number selects the behaviour: `FAIL` answers with an
/// error code, `HTTP500` with a server error, `SLOW` after a delay, `GBK`
/// with a body that is not UTF-8 and `HUGE` with a body over 1 MB.
pub async fn spawn_provider() -> (String, MockProvider) {
    let provider = MockProvider::default();

    let router = Router::new()
        .route("/mmpaymkttransfers/promotion/transfers", post(transfers))
        .with_state(provider.clone());

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    tokio::spawn(async move { axum::serve(listener, router).await.unwrap() });

    (
        format!("http://127.0.0.1:{port}/mmpaymkttransfers/promotion/transfers"),
        provider,
    )
}

async fn transfers(State(provider): State<MockProvider>, body: String) -> Response {
    let Ok(mut fields) = parse_envelope(&body) else {
        return (StatusCode::BAD_REQUEST, "not an envelope").into_response();
    };
    provider.received.lock().unwrap().push(fields.clone());

    let trade_no = fields.get("partner_trade_no").cloned().unwrap_or_default();
    let signature = fields.remove(SIGN_FIELD).unwrap_or_default();

    if signature != sign(&fields, MERCHANT_KEY, SignType::Md5) {
        return error_body("SIGN_ERROR", "signature mismatch").into_response();
    }

    match trade_no.as_str() {
        "FAIL" => error_body("40001", "bad sign").into_response(),
        "HTTP500" => (StatusCode::INTERNAL_SERVER_ERROR, "boom").into_response(),
        "SLOW" => {
            tokio::time::sleep(Duration::from_secs(2)).await;
            "<xml></xml>".into_response()
        }
        "GBK" => {
            let mut body = b"<xml><return_code>SUCCESS</return_code><re_user_name>".to_vec();
            body.extend_from_slice(&[0xD5, 0xC5, 0xC8, 0xFD]);
            body.extend_from_slice(b"</re_user_name></xml>");
            body.into_response()
        }
        "HUGE" => {
            format!("<xml><desc>{}</desc></xml>", "a".repeat(2 * 1024 * 1024)).into_response()
        }
        _ => format!(
            "<xml><return_code><![CDATA[SUCCESS]]></return_code>\
             <result_code><![CDATA[SUCCESS]]></result_code>\
             <partner_trade_no><![CDATA[{trade_no}]]></partner_trade_no>\
             <payment_no><![CDATA[1000018301201505190181489473]]></payment_no>\
             <payment_time><![CDATA[2015-05-19 15:26:59]]></payment_time></xml>"
        )
        .into_response(),
    }
}

fn error_body(code: &str, message: &str) -> String {
    format!("<xml><errcode>{code}</errcode><errmsg><![CDATA[{message}]]></errmsg></xml>")
}
