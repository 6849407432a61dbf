//! Database seeder for Viatix development and testing.
//!
//! Seeds the administrator account, the shared petty-cash fund (pseudo-user
//! plus its project) and a couple of professionals for local development.
//!
//! Usage: cargo run --bin seeder

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, Set};
use uuid::Uuid;
use viatix_db::entities::{
    projects,
    sea_orm_active_enums::{ProjectKind, ProjectStatus, UserRole},
    users,
};

/// Admin account ID (consistent for all seeds)
const ADMIN_ID: &str = "00000000-0000-0000-0000-000000000001";
/// Petty-cash fund pseudo-user ID
const PETTY_CASH_USER_ID: &str = "00000000-0000-0000-0000-000000000002";
/// Petty-cash project ID
const PETTY_CASH_PROJECT_ID: &str = "00000000-0000-0000-0000-000000000003";

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    let database_url =
        std::env::var("DATABASE_URL").expect("DATABASE_URL must be set in environment");

    println!("Connecting to database...");
    let db = viatix_db::connect(&database_url)
        .await
        .expect("Failed to connect to database");

    println!("Seeding admin account...");
    seed_admin(&db).await;

    println!("Seeding petty-cash fund...");
    seed_petty_cash(&db).await;

    println!("Seeding professionals...");
    seed_professionals(&db).await;

    println!("Seeding complete!");
}

fn admin_id() -> Uuid {
    Uuid::parse_str(ADMIN_ID).unwrap()
}

async fn seed_admin(db: &DatabaseConnection) {
    if users::Entity::find_by_id(admin_id())
        .one(db)
        .await
        .expect("Failed to query users")
        .is_some()
    {
        println!("  admin already present, skipping");
        return;
    }

    let now = Utc::now().into();
    users::ActiveModel {
        id: Set(admin_id()),
        display_name: Set("Administracion".to_string()),
        email: Set("admin@viatix.local".to_string()),
        code: Set(None),
        role: Set(UserRole::Admin),
        balance: Set(Decimal::ZERO),
        is_active: Set(true),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(db)
    .await
    .expect("Failed to seed admin");
}

async fn seed_petty_cash(db: &DatabaseConnection) {
    let user_id = Uuid::parse_str(PETTY_CASH_USER_ID).unwrap();
    let project_id = Uuid::parse_str(PETTY_CASH_PROJECT_ID).unwrap();
    let now = Utc::now().into();

    if users::Entity::find_by_id(user_id)
        .one(db)
        .await
        .expect("Failed to query users")
        .is_none()
    {
        // Shared balance holder for petty-cash spending.
        users::ActiveModel {
            id: Set(user_id),
            display_name: Set("Fondo Caja Chica".to_string()),
            email: Set("caja-chica@viatix.local".to_string()),
            code: Set(Some("CC".to_string())),
            role: Set(UserRole::Professional),
            balance: Set(Decimal::ZERO),
            is_active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(db)
        .await
        .expect("Failed to seed petty-cash user");
    }

    if projects::Entity::find_by_id(project_id)
        .one(db)
        .await
        .expect("Failed to query projects")
        .is_none()
    {
        projects::ActiveModel {
            id: Set(project_id),
            name: Set("Caja Chica".to_string()),
            client: Set(None),
            code: Set(Some("CC-000".to_string())),
            recurrence: Set(None),
            kind: Set(ProjectKind::PettyCash),
            status: Set(ProjectStatus::Active),
            expenses: Set(Decimal::ZERO),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(db)
        .await
        .expect("Failed to seed petty-cash project");
    }
}

async fn seed_professionals(db: &DatabaseConnection) {
    let professionals = [
        ("Ana Diaz", "ana@viatix.local", "AD"),
        ("Bruno Rojas", "bruno@viatix.local", "BR"),
    ];

    let now = Utc::now().into();
    for (name, email, code) in professionals {
        let existing = users::Entity::find()
            .all(db)
            .await
            .expect("Failed to query users")
            .into_iter()
            .any(|u| u.email == email);
        if existing {
            println!("  {email} already present, skipping");
            continue;
        }

        users::ActiveModel {
            id: Set(Uuid::now_v7()),
            display_name: Set(name.to_string()),
            email: Set(email.to_string()),
            code: Set(Some(code.to_string())),
            role: Set(UserRole::Professional),
            balance: Set(Decimal::ZERO),
            is_active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(db)
        .await
        .expect("Failed to seed professional");
    }
}
