// Application state for HTTP handlers
use crate::application::live_session::LiveSessionHandle;

pub struct AppState {
    pub session: LiveSessionHandle,
}
