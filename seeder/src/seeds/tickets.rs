use crate::seed::{SeedError, SeedFuture, Seeder};
use chrono::{Duration, Utc};
use db::models::ticket::{self, Model, NewTicket, Resolution, TicketPriority};
use db::models::user::{Model as UserModel, Role};
use fake::{Fake, faker::lorem::en::Sentence};
use sea_orm::{ActiveModelTrait, ActiveValue::Set, DatabaseConnection};

const ISSUES: [(&str, &str); 8] = [
    ("Printer down", "Office 2B"),
    ("VPN keeps dropping", "Remote"),
    ("Projector has no signal", "Meeting room 1"),
    ("Laptop will not boot", "Reception"),
    ("Shared drive unreachable", "Accounts"),
    ("Phone line crackles", "Sales floor"),
    ("Scanner leaves streaks", "Archive"),
    ("Wi-Fi slow on second floor", "Second floor"),
];

const PRIORITIES: [TicketPriority; 3] = [
    TicketPriority::High,
    TicketPriority::Medium,
    TicketPriority::Low,
];

pub struct TicketSeeder;

impl Seeder for TicketSeeder {
    fn seed<'a>(&'a self, db: &'a DatabaseConnection) -> SeedFuture<'a> {
        Box::pin(async move {
            let clients = UserModel::find_by_role(db, Role::Client).await?;
            let technicians = UserModel::find_by_role(db, Role::Technician).await?;
            if clients.is_empty() || technicians.is_empty() {
                return Err(SeedError::Missing("seed users before tickets"));
            }

            for (i, (title, location)) in ISSUES.into_iter().enumerate() {
                let client = &clients[fastrand::usize(..clients.len())];
                let description: String = Sentence(6..14).fake();

                let created = Model::create(
                    db,
                    client.id,
                    NewTicket {
                        title: title.to_string(),
                        description,
                        location: Some(location.to_string()),
                        priority: Some(PRIORITIES[fastrand::usize(..PRIORITIES.len())]),
                    },
                )
                .await?;

                // Spread ages over the last three days so some tickets are overdue.
                let mut aged: ticket::ActiveModel = created.into();
                aged.created_at = Set(Utc::now() - Duration::hours(fastrand::i64(0..72)));
                let created = aged.update(db).await?;

                // Cycle through open, in progress and closed.
                if i % 3 == 0 {
                    continue;
                }
                let tech = &technicians[fastrand::usize(..technicians.len())];
                Model::assign(db, created.id, Some(tech.id)).await?;

                if i % 3 == 2 {
                    Model::resolve(
                        db,
                        created.id,
                        Resolution {
                            work_performed: Sentence(4..10).fake(),
                            materials_used: Some("None".to_string()),
                            visited_at: None,
                            photo_filename: None,
                        },
                    )
                    .await?;
                }
            }

            Ok(())
        })
    }
}
