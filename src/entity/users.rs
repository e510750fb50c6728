use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Account role. Privileges are derived from it through the capability predicates below.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    EnumIter,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
    ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[serde(rename_all = "snake_case")]
pub enum Role {
    #[sea_orm(string_value = "guest")]
    Guest,
    #[sea_orm(string_value = "client")]
    Client,
    #[sea_orm(string_value = "manager")]
    Manager,
    #[sea_orm(string_value = "admin")]
    Admin,
}

impl Role {
    /// Create, update and delete products.
    pub fn can_manage_catalog(self) -> bool {
        matches!(self, Role::Admin)
    }

    pub fn can_view_orders(self) -> bool {
        matches!(self, Role::Manager | Role::Admin)
    }

    /// Mutate orders, pickup points and accounts.
    pub fn can_manage_directory(self) -> bool {
        matches!(self, Role::Admin)
    }

    /// Staff flag granted alongside the role.
    pub fn is_staff(self) -> bool {
        matches!(self, Role::Admin)
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub login: String,
    pub password_hash: String,
    pub role: Role,
    pub last_name: String,
    pub first_name: String,
    pub patronymic: String,
    pub is_staff: bool,
    pub is_superuser: bool,
}

impl Model {
    /// "surname given patronymic", or the login when no name parts are set.
    pub fn display_name(&self) -> String {
        let name = format!("{} {} {}", self.last_name, self.first_name, self.patronymic);
        let name = name.trim();
        if name.is_empty() {
            self.login.clone()
        } else {
            name.to_string()
        }
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::orders::Entity")]
    Orders,
}

impl Related<super::orders::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Orders.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(last: &str, first: &str, patronymic: &str) -> Model {
        Model {
            id: 1,
            login: "login".into(),
            password_hash: "!".into(),
            role: Role::Client,
            last_name: last.into(),
            first_name: first.into(),
            patronymic: patronymic.into(),
            is_staff: false,
            is_superuser: false,
        }
    }

    #[test]
    fn display_name_joins_parts() {
        assert_eq!(user("Ivanov", "Ivan", "Ivanovich").display_name(), "Ivanov Ivan Ivanovich");
        assert_eq!(user("Ivanov", "Ivan", "").display_name(), "Ivanov Ivan");
    }

    #[test]
    fn display_name_falls_back_to_login() {
        assert_eq!(user("", "", "").display_name(), "login");
    }

    #[test]
    fn only_admin_manages_catalog() {
        assert!(Role::Admin.can_manage_catalog());
        for role in [Role::Guest, Role::Client, Role::Manager] {
            assert!(!role.can_manage_catalog());
            assert!(!role.is_staff());
        }
        assert!(Role::Manager.can_view_orders());
        assert!(!Role::Client.can_view_orders());
    }
}
