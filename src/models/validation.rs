use serde::{Deserialize, Serialize};

/// Why a URL failed validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// DNS, connect, TLS, timeout or an unparseable URL.
    Transport,
    /// The server answered with status >= 400.
    HttpStatus,
    /// A document URL served as a markup page.
    TypeMismatch,
    /// A success status whose body reads as an error page.
    SoftFailure,
    /// A paywall, when those are configured to reject.
    Paywall,
    /// A login or institutional-access wall, when paywalls are configured to reject.
    LoginRequired,
}

impl FailureKind {
    /// Hard failures are the ones the server admits to.
    pub fn is_hard(&self) -> bool {
        matches!(self, Self::Transport | Self::HttpStatus)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Transport => "transport",
            Self::HttpStatus => "http_status",
            Self::TypeMismatch => "type_mismatch",
            Self::SoftFailure => "soft_failure",
            Self::Paywall => "paywall",
            Self::LoginRequired => "login_required",
        }
    }
}

/// Category of an access-barrier phrase found in a reachable page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BarrierKind {
    Paywall,
    Login,
    /// Only a preview, excerpt or sample of the work is shown.
    Preview,
}

impl BarrierKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Paywall => "paywall",
            Self::Login => "login",
            Self::Preview => "preview",
        }
    }

    /// Paywalls and login walls hide the work; a preview still shows part of it.
    pub fn blocks_access(&self) -> bool {
        matches!(self, Self::Paywall | Self::Login)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessBarrier {
    pub kind: BarrierKind,
    /// Name of the matching pattern.
    pub pattern: String,
}

impl std::fmt::Display for AccessBarrier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.kind.as_str(), self.pattern)
    }
}

/// Outcome of checking one URL. Created fresh per attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub url: String,
    pub valid: bool,
    pub http_status: Option<u16>,
    pub content_type: Option<String>,
    pub failure_kind: Option<FailureKind>,
    pub failure_reason: Option<String>,
    pub transport_error: Option<String>,
    /// URL after redirects, when it differs from the requested one.
    pub final_url: Option<String>,
    /// Paywall, login or preview phrasing seen in an otherwise valid page.
    pub access_barrier: Option<AccessBarrier>,
}

impl ValidationResult {
    pub fn success(url: &str, http_status: u16, content_type: Option<String>) -> Self {
        Self {
            url: url.to_string(),
            valid: true,
            http_status: Some(http_status),
            content_type,
            failure_kind: None,
            failure_reason: None,
            transport_error: None,
            final_url: None,
            access_barrier: None,
        }
    }

    pub fn transport(url: &str, error: String) -> Self {
        Self {
            url: url.to_string(),
            valid: false,
            http_status: None,
            content_type: None,
            failure_kind: Some(FailureKind::Transport),
            failure_reason: Some("transport error".to_string()),
            transport_error: Some(error),
            final_url: None,
            access_barrier: None,
        }
    }

    pub fn http_status(url: &str, status: u16) -> Self {
        Self {
            url: url.to_string(),
            valid: false,
            http_status: Some(status),
            content_type: None,
            failure_kind: Some(FailureKind::HttpStatus),
            failure_reason: Some(format!("HTTP {}", status)),
            transport_error: None,
            final_url: None,
            access_barrier: None,
        }
    }

    /// Turn a passing result into a failing one, keeping status and type.
    pub fn reject(mut self, kind: FailureKind, reason: String) -> Self {
        self.valid = false;
        self.failure_kind = Some(kind);
        self.failure_reason = Some(reason);
        self
    }

    pub fn is_hard_failure(&self) -> bool {
        self.failure_kind.map_or(false, |k| k.is_hard())
    }

    pub fn is_soft_failure(&self) -> bool {
        self.failure_kind.map_or(false, |k| !k.is_hard())
    }
}
