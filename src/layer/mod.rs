//! Binding of session cookies onto recognized heatmap tile layers.
//!
//! When the host application opens a tile layer whose identifier is one of
//! the known heatmap layers, the binding obtains the session cookies and
//! rewrites the layer's URL from the public low-resolution tile path to the
//! authenticated one, carrying the cookies as query parameters (the layer
//! object cannot be configured with a custom request header). Failures are
//! reported through the host's notification channel and leave the layer in
//! its unauthenticated configuration.

use std::sync::Arc;

use tracing::{debug, error, info};

use crate::auth::{SessionError, SessionManager};

/// Public (unauthenticated, low-resolution) tile path segment.
pub const PUBLIC_PATH_SEGMENT: &str = "/tiles/";
/// Authenticated (high-resolution) tile path segment.
pub const AUTH_PATH_SEGMENT: &str = "/tiles-auth/";
/// Maximum zoom level available on the authenticated tile tier.
pub const AUTHENTICATED_MAX_ZOOM: u8 = 15;

/// The heatmap layer identifiers published in the host's default imagery set.
const DEFAULT_LAYER_IDS: [&str; 5] = [
    "strava_cycling_heatmap",
    "strava_running_heatmap",
    "strava_both_heatmap",
    "strava_water_heatmap",
    "strava_winter_heatmap",
];

/// A tile layer descriptor owned by the host application.
pub trait TileLayer {
    /// The layer's declared identifier.
    fn id(&self) -> &str;
    /// The layer's current base URL.
    fn url(&self) -> &str;
    /// Replaces the layer's base URL.
    fn set_url(&mut self, url: String);
    /// Raises (or lowers) the layer's maximum zoom level.
    fn set_max_zoom(&mut self, max_zoom: u8);
}

/// User-facing notification channel owned by the host application.
pub trait Notifier: Send + Sync {
    /// Shows a message to the user.
    fn show_message(&self, message: &str);
}

const AUTH_FAILURE_NOTICE: &str = "Authentication on the Strava website failed.\n\
    Please check the configured Strava account email and password.\n\
    Without authentication only the low-resolution heatmap will be available.";

const TRANSPORT_FAILURE_NOTICE: &str = "An error occurred when trying to authenticate on the Strava website.\n\
    This may be a temporary network issue.\n\
    Without authentication only the low-resolution heatmap will be available.";

/// Adds the session cookies to recognized heatmap layers as they are opened.
pub struct LayerBinding {
    session: Arc<SessionManager>,
    notifier: Box<dyn Notifier>,
    layer_ids: Vec<String>,
}

impl LayerBinding {
    /// Creates a binding recognizing the default heatmap layer identifiers.
    pub fn new(session: Arc<SessionManager>, notifier: Box<dyn Notifier>) -> Self {
        Self {
            session,
            notifier,
            layer_ids: DEFAULT_LAYER_IDS.iter().map(ToString::to_string).collect(),
        }
    }

    /// Replaces the set of recognized layer identifiers.
    #[must_use]
    pub fn with_layer_ids<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.layer_ids = ids.into_iter().map(Into::into).collect();
        self
    }

    /// Returns true if `layer` is one of the recognized heatmap layers.
    #[must_use]
    pub fn is_heatmap_layer(&self, layer: &dyn TileLayer) -> bool {
        self.layer_ids.iter().any(|id| id == layer.id())
    }

    /// Rewrites `layer` to the authenticated tile tier if it is a
    /// recognized heatmap layer.
    ///
    /// A layer whose URL already points at the authenticated path is left
    /// alone. On failure the layer keeps its unauthenticated configuration
    /// and the user is notified; this never panics and never propagates an
    /// error into the host.
    pub async fn on_layer_added(&self, layer: &mut dyn TileLayer) {
        if !self.is_heatmap_layer(layer) {
            return;
        }
        debug!(layer = layer.id(), "recognized heatmap layer");

        if layer.url().contains(AUTH_PATH_SEGMENT) {
            debug!(layer = layer.id(), "layer already bound to authenticated tiles");
            return;
        }

        match self.session.session_query_params().await {
            Ok(query) => {
                let authenticated_url = layer
                    .url()
                    .replace(PUBLIC_PATH_SEGMENT, AUTH_PATH_SEGMENT)
                    + &query;
                layer.set_url(authenticated_url);
                layer.set_max_zoom(AUTHENTICATED_MAX_ZOOM);
                info!(layer = layer.id(), "switched layer to authenticated tiles");
            }
            Err(SessionError::Auth(auth_error)) => {
                error!(layer = layer.id(), error = %auth_error, "authentication failed");
                self.notifier.show_message(AUTH_FAILURE_NOTICE);
            }
            Err(SessionError::Transport(transport_error)) => {
                error!(layer = layer.id(), error = %transport_error, "session retrieval failed");
                self.notifier.show_message(TRANSPORT_FAILURE_NOTICE);
            }
        }
    }
}
