use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use chrono::Weekday;
use tracing::warn;

/// Which persistence backend the booking core runs against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    /// Supabase when configured, local records otherwise.
    Auto,
    Supabase,
    Local,
}

impl FromStr for BackendKind {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "auto" | "" => Ok(BackendKind::Auto),
            "supabase" | "postgres" => Ok(BackendKind::Supabase),
            "local" | "file" => Ok(BackendKind::Local),
            other => Err(format!("unknown booking backend '{}'", other)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub supabase_url: String,
    pub supabase_anon_key: String,
    pub supabase_service_role_key: String,
    pub supabase_jwt_secret: String,
    pub booking_backend: BackendKind,
    pub local_data_dir: PathBuf,
    pub resend_api_key: String,
    pub resend_base_url: String,
    pub email_from: String,
    pub admin_email: String,
    /// Origin of this API; approval links point here.
    pub public_base_url: String,
    /// Origin of the client-facing site; post-approval redirects land here.
    pub site_base_url: String,
    pub business_utc_offset_minutes: i32,
    pub business_closed_weekday: Weekday,
    pub notification_timeout_secs: u64,
    pub server_port: u16,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            supabase_url: String::new(),
            supabase_anon_key: String::new(),
            supabase_service_role_key: String::new(),
            supabase_jwt_secret: String::new(),
            booking_backend: BackendKind::Auto,
            local_data_dir: PathBuf::from("data"),
            resend_api_key: String::new(),
            resend_base_url: "https://api.resend.com".to_string(),
            email_from: "Luxe Salon <onboarding@resend.dev>".to_string(),
            admin_email: String::new(),
            public_base_url: "http://localhost:3000".to_string(),
            site_base_url: "http://localhost:3000".to_string(),
            business_utc_offset_minutes: 120,
            business_closed_weekday: Weekday::Sun,
            notification_timeout_secs: 10,
            server_port: 3000,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let public_base_url = env::var("PUBLIC_BASE_URL")
            .unwrap_or_else(|_| {
                warn!("PUBLIC_BASE_URL not set, using default");
                defaults.public_base_url.clone()
            });
        let site_base_url = env::var("SITE_BASE_URL")
            .unwrap_or_else(|_| {
                warn!("SITE_BASE_URL not set, assuming the site is served from PUBLIC_BASE_URL");
                public_base_url.clone()
            });

        let config = Self {
            supabase_url: env::var("SUPABASE_URL")
                .unwrap_or_else(|_| {
                    warn!("SUPABASE_URL not set, using empty value");
                    String::new()
                }),
            supabase_anon_key: env::var("SUPABASE_ANON_PUBLIC_KEY")
                .unwrap_or_else(|_| {
                    warn!("SUPABASE_ANON_PUBLIC_KEY not set, using empty value");
                    String::new()
                }),
            supabase_service_role_key: env::var("SUPABASE_SERVICE_ROLE_KEY")
                .unwrap_or_default(),
            supabase_jwt_secret: env::var("SUPABASE_JWT_SECRET")
                .unwrap_or_else(|_| {
                    warn!("SUPABASE_JWT_SECRET not set, admin routes will reject every token");
                    String::new()
                }),
            booking_backend: env::var("BOOKING_BACKEND")
                .ok()
                .and_then(|raw| match raw.parse() {
                    Ok(kind) => Some(kind),
                    Err(e) => {
                        warn!("{}, falling back to auto", e);
                        None
                    }
                })
                .unwrap_or(defaults.booking_backend),
            local_data_dir: env::var("LOCAL_DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.local_data_dir),
            resend_api_key: env::var("RESEND_API_KEY")
                .unwrap_or_else(|_| {
                    warn!("RESEND_API_KEY not set, email notifications are mocked");
                    String::new()
                }),
            resend_base_url: env::var("RESEND_BASE_URL")
                .unwrap_or(defaults.resend_base_url),
            email_from: env::var("BOOKING_EMAIL_FROM")
                .unwrap_or(defaults.email_from),
            admin_email: env::var("ADMIN_EMAIL")
                .unwrap_or_else(|_| {
                    warn!("ADMIN_EMAIL not set, admin approval emails cannot be delivered");
                    String::new()
                }),
            public_base_url,
            site_base_url,
            business_utc_offset_minutes: parse_env("BUSINESS_UTC_OFFSET_MINUTES")
                .unwrap_or(defaults.business_utc_offset_minutes),
            business_closed_weekday: parse_env::<Weekday>("BUSINESS_CLOSED_WEEKDAY")
                .unwrap_or(defaults.business_closed_weekday),
            notification_timeout_secs: parse_env("NOTIFICATION_TIMEOUT_SECS")
                .unwrap_or(defaults.notification_timeout_secs),
            server_port: parse_env("SERVER_PORT")
                .unwrap_or(defaults.server_port),
        };

        if !config.is_configured() {
            warn!("Supabase not configured - bookings will use local records");
        }

        config
    }

    pub fn is_configured(&self) -> bool {
        !self.supabase_url.is_empty() && !self.supabase_anon_key.is_empty()
    }

    pub fn is_email_configured(&self) -> bool {
        !self.resend_api_key.is_empty()
    }

    /// Resolves `Auto` against the Supabase settings.
    pub fn resolved_backend(&self) -> BackendKind {
        match self.booking_backend {
            BackendKind::Auto if self.is_configured() => BackendKind::Supabase,
            BackendKind::Auto => BackendKind::Local,
            explicit => explicit,
        }
    }

    /// Key used for privileged REST calls; falls back to the anon key.
    pub fn supabase_privileged_key(&self) -> &str {
        if self.supabase_service_role_key.is_empty() {
            &self.supabase_anon_key
        } else {
            &self.supabase_service_role_key
        }
    }
}

fn parse_env<T: FromStr>(name: &str) -> Option<T> {
    let raw = env::var(name).ok()?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!("{} has invalid value '{}', using default", name, raw);
            None
        }
    }
}
