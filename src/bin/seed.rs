use clap::Parser;
use retail_orders::{
    config::AppConfig,
    db::{create_orm_conn, run_migrations},
    entity::users::{ActiveModel as UserActive, Column as UserCol, Entity as Users},
    models::Role,
    services::auth_service::hash_password,
};
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};

/// Ensures a superuser account exists. Imports never remove it.
#[derive(Debug, Parser)]
#[command(name = "seed")]
struct Args {
    #[arg(long, env = "ADMIN_LOGIN", default_value = "admin")]
    login: String,
    #[arg(long, env = "ADMIN_PASSWORD")]
    password: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,retail_orders=debug".into()),
        )
        .init();

    let args = Args::parse();
    let config = AppConfig::from_env()?;
    let orm = create_orm_conn(&config.database_url).await?;
    run_migrations(&orm).await?;

    let user_id = ensure_superuser(&orm, &args.login, &args.password).await?;
    println!("Seed completed. Superuser {} has ID {user_id}", args.login);
    Ok(())
}

async fn ensure_superuser(
    conn: &DatabaseConnection,
    login: &str,
    password: &str,
) -> anyhow::Result<i32> {
    let password_hash = hash_password(password)?;
    let existing = Users::find()
        .filter(UserCol::Login.eq(login))
        .one(conn)
        .await?;

    let user = match existing {
        Some(user) => {
            let mut active: UserActive = user.into();
            active.password_hash = Set(password_hash);
            active.role = Set(Role::Admin);
            active.is_staff = Set(true);
            active.is_superuser = Set(true);
            active.update(conn).await?
        }
        None => {
            UserActive {
                login: Set(login.to_string()),
                password_hash: Set(password_hash),
                role: Set(Role::Admin),
                last_name: Set(String::new()),
                first_name: Set(String::new()),
                patronymic: Set(String::new()),
                is_staff: Set(true),
                is_superuser: Set(true),
                ..Default::default()
            }
            .insert(conn)
            .await?
        }
    };

    tracing::info!(user_id = user.id, login = %user.login, "superuser ensured");
    Ok(user.id)
}
