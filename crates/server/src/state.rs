use std::sync::Arc;

use service::auth::Session;
use service::portal::DynPortalClient;
use service::sql::QueryClient;

/// Shared handler state: the portal client, the write session, the admin
/// keys accepted on write routes and, when configured, the SQL endpoint.
#[derive(Clone)]
pub struct AppState {
    pub portal: Arc<DynPortalClient>,
    pub session: Arc<Session>,
    pub admin_keys: Arc<Vec<String>>,
    pub sql: Option<Arc<QueryClient>>,
}

impl AppState {
    pub fn new(portal: DynPortalClient, session: Session, admin_keys: Vec<String>) -> Self {
        Self {
            portal: Arc::new(portal),
            session: Arc::new(session),
            admin_keys: Arc::new(admin_keys),
            sql: None,
        }
    }

    pub fn with_sql(mut self, sql: Option<QueryClient>) -> Self {
        self.sql = sql.map(Arc::new);
        self
    }
}
