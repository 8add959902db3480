use crate::seed::{Seeder, run_seeder};
use crate::seeds::{tickets::TicketSeeder, user::UserSeeder};
use colored::*;

mod seed;
mod seeds;

#[tokio::main]
async fn main() {
    let db = match db::connect_and_migrate().await {
        Ok(db) => db,
        Err(e) => {
            eprintln!(
                "{} {} ({e})",
                "Could not open".red(),
                util::config::database_path()
            );
            std::process::exit(1);
        }
    };

    for (seeder, name) in [
        (Box::new(UserSeeder) as Box<dyn Seeder + Send + Sync>, "User"),
        (Box::new(TicketSeeder), "Ticket"),
    ] {
        run_seeder(&*seeder, name, &db).await;
    }
}
