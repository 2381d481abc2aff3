//! The tracker: per-visitor identity state plus the transport that reports it

use reqwest::header::USER_AGENT;
use reqwest::{Client, Request};
use tracing::{debug, warn};

use crate::error::Error;
use crate::models::{Identity, Properties};
use crate::request::{self, Payload};

/// Back-end tracker for a single visitor/session.
///
/// Holds the visitor's identity, properties and transport configuration,
/// and reports them to the collection host over HTTP GET. `identify`
/// mutates local state only; `track` and `push` each issue one request and
/// discard the response body unread.
///
/// One instance per visitor. The mutating operations take `&mut self`, so
/// sharing a tracker across tasks requires external synchronization; that
/// is the caller's responsibility.
#[derive(Debug, Clone)]
pub struct Tracker {
    domain: String,
    secure: bool,
    idle_timeout: Option<u64>,
    identifier_cookie: Option<String>,
    user_properties: Properties,
    user_agent: Option<String>,
    ip_address: Option<String>,
    client: Client,
}

impl Tracker {
    /// Default session idle cutoff reported to the service, in
    /// milliseconds.
    pub const DEFAULT_IDLE_TIMEOUT_MS: u64 = 300_000;

    /// Create a tracker for `domain` (the site name registered with the
    /// service) with default settings: plaintext transport, default idle
    /// timeout, a fresh HTTP client.
    pub fn new(domain: impl Into<String>) -> Self {
        Self::builder(domain).build()
    }

    /// Start building a tracker with non-default settings.
    pub fn builder(domain: impl Into<String>) -> TrackerBuilder {
        TrackerBuilder {
            domain: domain.into(),
            secure: false,
            idle_timeout: Some(Self::DEFAULT_IDLE_TIMEOUT_MS),
            client: None,
        }
    }

    /// Attach an identity to the visitor.
    ///
    /// `properties` replaces the visitor's property map wholesale (the last
    /// call wins, there is no merging), and `ip_address`/`user_agent` are
    /// assigned as given, clearing any previous value when `None`. An email
    /// identity additionally stores the address as the `email` property and
    /// derives the visitor identifier from a hash of it; a unique-id
    /// identity becomes the identifier verbatim.
    ///
    /// No network call is made; the identity travels with the next `track`
    /// or `push`.
    pub fn identify(
        &mut self,
        identity: Identity,
        properties: Properties,
        ip_address: Option<&str>,
        user_agent: Option<&str>,
    ) {
        self.ip_address = ip_address.map(str::to_owned);
        self.user_agent = user_agent.map(str::to_owned);
        self.user_properties = properties;

        match identity {
            Identity::Email(email) => {
                self.identifier_cookie = Some(request::identifier_for_email(&email));
                self.user_properties.set("email", email);
            }
            Identity::UniqueId(id) => {
                self.identifier_cookie = Some(id);
            }
        }
    }

    /// Report a pageview or custom event.
    ///
    /// An omitted or empty `event_name` reports a pageview. `event_data`
    /// carries event-scoped properties; `referer` is the referring URL, if
    /// any.
    pub async fn track(
        &self,
        event_name: Option<&str>,
        event_data: &Properties,
        referer: Option<&str>,
    ) -> Result<(), Error> {
        self.send(Payload::Event {
            name: event_name,
            data: event_data,
            referer,
        })
        .await
    }

    /// Report the visitor's identity without an accompanying event.
    pub async fn push(&self) -> Result<(), Error> {
        self.send(Payload::Identify).await
    }

    /// Set the session idle cutoff reported to the service, in
    /// milliseconds. This is a protocol parameter, not a local network
    /// timeout.
    pub fn set_idle_timeout(&mut self, ms: u64) {
        self.idle_timeout = Some(ms);
    }

    /// Switch between encrypted (`true`) and plaintext (`false`) transport.
    pub fn set_secure(&mut self, secure: bool) {
        self.secure = secure;
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }

    pub fn secure(&self) -> bool {
        self.secure
    }

    pub fn idle_timeout(&self) -> Option<u64> {
        self.idle_timeout
    }

    /// The visitor's resolved tracking identifier, if one has been set by
    /// `identify`.
    pub fn identifier_cookie(&self) -> Option<&str> {
        self.identifier_cookie.as_deref()
    }

    pub fn user_properties(&self) -> &Properties {
        &self.user_properties
    }

    pub fn ip_address(&self) -> Option<&str> {
        self.ip_address.as_deref()
    }

    pub fn user_agent(&self) -> Option<&str> {
        self.user_agent.as_deref()
    }

    fn build_request(&self, payload: &Payload<'_>) -> Result<Request, Error> {
        let scheme = if self.secure { "https" } else { "http" };
        let url = format!("{scheme}://{}{}", request::TRACKING_HOST, payload.path());
        let params = request::query_params(
            &self.domain,
            self.ip_address.as_deref(),
            self.idle_timeout,
            &self.user_properties,
            payload,
        );

        let mut builder = self.client.get(url).query(&params);
        if let Some(agent) = &self.user_agent {
            builder = builder.header(USER_AGENT, agent.as_str());
        }
        builder.build().map_err(Error::Request)
    }

    async fn send(&self, payload: Payload<'_>) -> Result<(), Error> {
        let request = self.build_request(&payload).inspect_err(|error| {
            warn!("Failed to build tracking request: {error}");
        })?;

        debug!(url = %request.url(), "Sending tracking request");
        match self.client.execute(request).await {
            Ok(_response) => Ok(()),
            Err(error) => {
                warn!("Tracking request failed: {error}");
                Err(Error::Transport(error))
            }
        }
    }
}

/// Builder for a [`Tracker`] with non-default settings.
#[derive(Debug)]
pub struct TrackerBuilder {
    domain: String,
    secure: bool,
    idle_timeout: Option<u64>,
    client: Option<Client>,
}

impl TrackerBuilder {
    /// Use encrypted transport from the start.
    pub fn secure(mut self, secure: bool) -> Self {
        self.secure = secure;
        self
    }

    /// Override the default idle timeout, in milliseconds.
    pub fn idle_timeout(mut self, ms: u64) -> Self {
        self.idle_timeout = Some(ms);
        self
    }

    /// Omit the `timeout` parameter from requests entirely.
    pub fn no_idle_timeout(mut self) -> Self {
        self.idle_timeout = None;
        self
    }

    /// Supply the HTTP client to send requests with. Lets applications
    /// share one connection pool across trackers and lets tests intercept
    /// the transport.
    pub fn client(mut self, client: Client) -> Self {
        self.client = Some(client);
        self
    }

    pub fn build(self) -> Tracker {
        Tracker {
            domain: self.domain,
            secure: self.secure,
            idle_timeout: self.idle_timeout,
            identifier_cookie: None,
            user_properties: Properties::new(),
            user_agent: None,
            ip_address: None,
            client: self.client.unwrap_or_default(),
        }
    }
}
