//! SeaORM entities for the core proxy.

pub use principal::Entity as PrincipalEntity;
pub use proxy_log::Entity as ProxyLogEntity;

/// Principal entity module.
pub mod principal {
    use chrono::{DateTime, Utc};
    use sea_orm::entity::prelude::*;
    use uuid::Uuid;

    /// Locally known user for the `principal` table.
    #[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
    #[sea_orm(table_name = "principal")]
    pub struct Model {
        #[sea_orm(primary_key, auto_increment = false)]
        pub id: Uuid,
        #[sea_orm(unique)]
        pub email: String,
        /// Bearer token issued by the core service.
        pub access_token: Option<String>,
        pub is_active: bool,
        pub created_at: DateTime<Utc>,
        pub updated_at: DateTime<Utc>,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {}

    impl ActiveModelBehavior for ActiveModel {}
}

/// Proxy log entity module.
pub mod proxy_log {
    use chrono::{DateTime, Utc};
    use sea_orm::entity::prelude::*;

    /// One audited exchange for the `proxy_log` table.
    #[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
    #[sea_orm(table_name = "proxy_log")]
    pub struct Model {
        #[sea_orm(primary_key)]
        pub id: i64,
        pub core_method: String,
        pub core_url: String,
        pub core_request_headers: String,
        pub core_request_body: String,
        pub proxy_method: String,
        pub proxy_url: String,
        pub proxy_request_headers: String,
        pub proxy_request_body: String,
        pub core_status: i32,
        pub core_response_headers: String,
        pub core_response_body: String,
        pub proxy_status: i32,
        pub proxy_response_headers: String,
        pub proxy_response_body: String,
        pub created_at: DateTime<Utc>,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {}

    impl ActiveModelBehavior for ActiveModel {}
}
