//! Demo data for runs without a database

use op_db::{MemoryWorkPackageStore, RepositoryResult};
use op_models::{modules, Priority, Project, Status, Type, User, Version, WorkPackage, WorkPackageKind};

/// Id of the seeded administrator
pub const ADMIN_ID: i64 = 1;

/// Fill `store` with one demo project, its lookup tables and a welcome issue
pub async fn seed_demo(store: &MemoryWorkPackageStore) -> RepositoryResult<()> {
    store
        .insert_project(Project {
            id: Some(1),
            description: Some("Seeded because no database was reachable".into()),
            enabled_modules: vec![
                modules::WORK_PACKAGE_TRACKING.to_string(),
                modules::TIMELINES.to_string(),
            ],
            type_ids: vec![1, 2, 3],
            ..Project::new("demo-project", "Demo project")
        })
        .await?;

    for (id, name, position) in [(1, "Task", 1), (2, "Milestone", 2), (3, "Bug", 3)] {
        store
            .insert_type(Type {
                id: Some(id),
                position,
                ..Type::new(name)
            })
            .await;
    }

    for (id, name, position, closed) in [(1, "New", 1, false), (2, "In progress", 2, false), (3, "Closed", 3, true)] {
        store
            .insert_status(Status {
                id: Some(id),
                position,
                is_default: id == 1,
                is_closed: closed,
                ..Status::new(name)
            })
            .await;
    }

    for (id, name, position) in [(1, "Low", 1), (2, "Normal", 2), (3, "High", 3), (4, "Immediate", 4)] {
        store
            .insert_priority(Priority {
                id: Some(id),
                position,
                is_default: id == 2,
                ..Priority::new(name)
            })
            .await;
    }

    store
        .insert_user(User {
            id: Some(ADMIN_ID),
            admin: true,
            ..User::new("admin")
        })
        .await?;

    store
        .insert_version(Version {
            id: Some(1),
            ..Version::new("1.0", 1)
        })
        .await?;

    let mut welcome = WorkPackage::new(WorkPackageKind::Issue, 1);
    welcome.id = Some(1);
    welcome.subject = "Welcome to the demo project".into();
    welcome.type_id = Some(1);
    welcome.status_id = Some(1);
    welcome.priority_id = Some(2);
    welcome.author_id = Some(ADMIN_ID);
    welcome.created_at = Some(chrono::Utc::now());
    store.insert_work_package(welcome).await?;

    tracing::info!("Seeded in-memory store with demo data");
    Ok(())
}
