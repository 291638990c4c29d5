//! Community page fetch through Steam's age/content interstitial
//!
//! The protocol is a short, bounded state machine:
//!
//! ```text
//! Initial -> CheckInterstitial -> Done
//!                 |
//!                 v
//!            RetryDirect ------> Done   (bypass-marked URL came back clean)
//!                 |
//!                 v
//!            SubmitForm -------> Done   (body returned as-is after re-GET)
//! ```
//!
//! Each call owns its state; nothing is shared between invocations.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info};

use super::endpoints::{with_bypass_marker, Endpoints};
use super::fetcher::{FetchClient, FetchError, HttpRequest};
use crate::types::AppId;

/// Markers of the classic age gate and the newer content-preference page
pub const INTERSTITIAL_SIGNATURES: &[&str] = &[
    "agegate_birthday_selector",
    "agecheck_form",
    "app_agegate",
    "ageYear",
    "contentcheck_desc_ctn",
    "contentcheck_header",
    "View Community Hub",
    "THIS GAME CONTAINS CONTENT YOU HAVE ASKED NOT TO SEE",
    "AcceptAppHub",
];

const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";

/// 1990-01-01T00:00:00Z
const ADULT_BIRTHTIME: i64 = 631_152_000;
const ADULT_DAY: &str = "1";
const ADULT_MONTH: &str = "January";
const ADULT_YEAR: &str = "1990";

const SESSION_ID_LEN: usize = 24;
const HEX: &[u8; 16] = b"0123456789abcdef";

/// Does `html` look like an age or content interstitial?
pub fn is_interstitial(html: &str) -> bool {
    INTERSTITIAL_SIGNATURES.iter().any(|sig| html.contains(sig))
}

/// Source of session ids for the age-check form
pub trait SessionIdSource: Send + Sync {
    fn session_id(&self) -> String;
}

fn hex_session_id<R: Rng>(rng: &mut R) -> String {
    (0..SESSION_ID_LEN)
        .map(|_| HEX[rng.gen_range(0..HEX.len())] as char)
        .collect()
}

/// Fresh random ids from the thread-local generator
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomSessionIds;

impl SessionIdSource for RandomSessionIds {
    fn session_id(&self) -> String {
        hex_session_id(&mut rand::thread_rng())
    }
}

/// Deterministic ids: every call yields the id derived from `seed`
#[derive(Debug, Clone, Copy)]
pub struct SeededSessionIds {
    seed: u64,
}

impl SeededSessionIds {
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }
}

impl SessionIdSource for SeededSessionIds {
    fn session_id(&self) -> String {
        hex_session_id(&mut ChaCha8Rng::seed_from_u64(self.seed))
    }
}

/// Protocol states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgeGateState {
    Initial,
    CheckInterstitial,
    RetryDirect,
    SubmitForm,
}

/// How the final body was obtained
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// No interstitial on the first response
    NotGated,
    /// The bypass-marked URL returned clean content
    BypassMarker,
    /// Age form was posted; the body may still be gated
    AgeForm,
}

#[derive(Debug, Clone)]
pub struct CommunityPage {
    pub html: String,
    pub resolution: Resolution,
}

/// One community fetch through the age gate
pub struct AgeGate<'a> {
    fetcher: &'a FetchClient,
    endpoints: &'a Endpoints,
    session_ids: &'a dyn SessionIdSource,
}

impl<'a> AgeGate<'a> {
    pub fn new(
        fetcher: &'a FetchClient,
        endpoints: &'a Endpoints,
        session_ids: &'a dyn SessionIdSource,
    ) -> Self {
        Self {
            fetcher,
            endpoints,
            session_ids,
        }
    }

    fn cookies(appid: AppId) -> String {
        format!(
            "birthtime={}; lastagecheckage={}-{}-{}; mature_content=1; wants_mature_content=1; wants_mature_content_apps={}",
            ADULT_BIRTHTIME, ADULT_DAY, ADULT_MONTH, ADULT_YEAR, appid
        )
    }

    fn browser_get(url: &str, appid: AppId) -> HttpRequest {
        HttpRequest::get(url).headers([
            ("User-Agent", BROWSER_USER_AGENT.to_string()),
            (
                "Accept",
                "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8".to_string(),
            ),
            ("Accept-Language", "zh-CN,zh;q=0.9,en;q=0.8".to_string()),
            ("Cookie", Self::cookies(appid)),
        ])
    }

    /// Fetch the community page for `appid`, optionally a sub-section.
    ///
    /// Errors on a non-OK first response, on transport failures, and when the
    /// age form submission or the follow-up GET fails.
    pub async fn fetch(&self, appid: AppId, section: Option<&str>) -> Result<CommunityPage, FetchError> {
        let url = self.endpoints.community(appid, section);
        let mut body = String::new();
        let mut state = AgeGateState::Initial;

        loop {
            debug!(appid, ?state, "Age gate step");
            state = match state {
                AgeGateState::Initial => {
                    body = self
                        .fetcher
                        .send_checked(Self::browser_get(&url, appid))
                        .await?
                        .text();
                    AgeGateState::CheckInterstitial
                }
                AgeGateState::CheckInterstitial => {
                    if !is_interstitial(&body) {
                        return Ok(CommunityPage {
                            html: body,
                            resolution: Resolution::NotGated,
                        });
                    }
                    AgeGateState::RetryDirect
                }
                AgeGateState::RetryDirect => {
                    let bypass_url = with_bypass_marker(&url);
                    let response = self
                        .fetcher
                        .send(Self::browser_get(&bypass_url, appid))
                        .await?;
                    if response.is_ok() {
                        let retried = response.text();
                        if !is_interstitial(&retried) {
                            info!(appid, "Age gate cleared with bypass marker");
                            return Ok(CommunityPage {
                                html: retried,
                                resolution: Resolution::BypassMarker,
                            });
                        }
                    }
                    AgeGateState::SubmitForm
                }
                AgeGateState::SubmitForm => {
                    let session_id = self.session_ids.session_id();
                    let form = HttpRequest::post_form(
                        self.endpoints.age_check_submit(appid),
                        &[
                            ("sessionid", session_id.as_str()),
                            ("ageDay", ADULT_DAY),
                            ("ageMonth", ADULT_MONTH),
                            ("ageYear", ADULT_YEAR),
                        ],
                    )
                    .header("User-Agent", BROWSER_USER_AGENT)
                    .header(
                        "Cookie",
                        format!("{}; sessionid={}", Self::cookies(appid), session_id),
                    )
                    .header(
                        "Referer",
                        format!("{}/agecheck/app/{}/", self.endpoints.store_base(), appid),
                    );
                    self.fetcher.send_checked(form).await?;

                    let html = self
                        .fetcher
                        .send_checked(Self::browser_get(&url, appid))
                        .await?
                        .text();
                    info!(appid, still_gated = is_interstitial(&html), "Age form submitted");
                    return Ok(CommunityPage {
                        html,
                        resolution: Resolution::AgeForm,
                    });
                }
            };
        }
    }
}
