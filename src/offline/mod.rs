//! Device-level fallback delivery: SMS compose and dialer handoffs.
//!
//! Both primitives are fire-and-forget handoffs to the host's native
//! messaging/dialer surface via `sms:` and `tel:` URIs. A `true` return
//! means the handoff was invoked without error - it is never a delivery
//! confirmation, since the user completes (or abandons) the action in the
//! external app.

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use tracing::{debug, warn};

/// RFC 3986 unreserved characters stay literal; everything else is
/// percent-encoded, matching what `encodeURIComponent` produces for the
/// message body.
const BODY_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Best-effort device delivery primitives, selected only on the offline path.
#[allow(async_fn_in_trait)]
pub trait FallbackChannel {
    /// Open the native SMS composer with a prefilled recipient and body.
    /// Returns whether the handoff itself succeeded.
    async fn compose_sms(&self, phone_number: &str, message: &str) -> bool;

    /// Open the native dialer for the given number.
    /// Returns whether the handoff itself succeeded.
    async fn dial(&self, phone_number: &str) -> bool;
}

/// `FallbackChannel` backed by the host OS URI handler.
#[derive(Debug, Clone, Copy, Default)]
pub struct DeviceHandoff;

/// Apple platforms join the body with `&`, everything else with `?`
#[cfg(any(target_os = "macos", target_os = "ios"))]
const SMS_BODY_SEPARATOR: char = '&';
#[cfg(not(any(target_os = "macos", target_os = "ios")))]
const SMS_BODY_SEPARATOR: char = '?';

/// Build the `sms:` URI for a prefilled compose handoff
pub fn sms_uri(phone_number: &str, message: &str) -> String {
    let body = utf8_percent_encode(message, BODY_ENCODE_SET);
    format!("sms:{}{}body={}", phone_number, SMS_BODY_SEPARATOR, body)
}

/// Build the `tel:` URI for a dial handoff
pub fn dial_uri(phone_number: &str) -> String {
    format!("tel:{}", phone_number)
}

/// Hand a URI to the OS-registered handler. Returns false if the opener
/// could not be spawned or reported failure.
async fn open_uri(uri: &str) -> bool {
    #[cfg(target_os = "macos")]
    let mut command = {
        let mut c = tokio::process::Command::new("open");
        c.arg(uri);
        c
    };
    #[cfg(target_os = "windows")]
    let mut command = {
        let mut c = tokio::process::Command::new("cmd");
        c.args(["/C", "start", "", uri]);
        c
    };
    #[cfg(not(any(target_os = "macos", target_os = "windows")))]
    let mut command = {
        let mut c = tokio::process::Command::new("xdg-open");
        c.arg(uri);
        c
    };

    match command.status().await {
        Ok(status) => status.success(),
        Err(e) => {
            warn!(uri = %uri, error = %e, "Failed to spawn URI handler");
            false
        }
    }
}

impl FallbackChannel for DeviceHandoff {
    async fn compose_sms(&self, phone_number: &str, message: &str) -> bool {
        let uri = sms_uri(phone_number, message);
        debug!(phone = %phone_number, "Opening SMS composer");
        open_uri(&uri).await
    }

    async fn dial(&self, phone_number: &str) -> bool {
        let uri = dial_uri(phone_number);
        debug!(phone = %phone_number, "Opening dialer");
        open_uri(&uri).await
    }
}
