pub mod auth;
pub mod extract;
pub mod fetcher;
pub mod session;

pub use auth::FormAuthenticator;
pub use extract::HtmlExtractor;
pub use fetcher::SessionFetcher;
pub use session::{DEFAULT_USER_AGENT, FETCH_TIMEOUT, LOGIN_TIMEOUT, Session, SessionCookies};
