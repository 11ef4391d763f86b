use std::error::Error;
use std::fs;
use std::path::PathBuf;

use dotenv::dotenv;
use log::{info, initialize_logger, warn};
use structopt::StructOpt;

use stride::config::get_variable;
use stride::db::PgDb;
use stride::item;

#[derive(Debug, StructOpt)]
#[structopt(
    name = "import-items",
    about = "Import collectible items from a CSV file and print the rows that were skipped"
)]
struct Opt {
    /// CSV file with a header row and the columns name, UID, value,
    /// latitude, longitude and picture URL
    #[structopt(parse(from_os_str))]
    path: PathBuf,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    dotenv().ok();

    let opt = Opt::from_args();

    let logger = initialize_logger();

    let connection_string = get_variable("STRIDE_DB_CONNECTION_STRING");
    let pool = sqlx::Pool::connect(&connection_string).await?;
    let db = PgDb::new(pool);

    info!(logger, "Reading items..."; "path" => %opt.path.display());
    let data = fs::read(&opt.path)?;

    let failed = item::import(&db, &data).await?;

    if failed.is_empty() {
        info!(logger, "Imported every row");
    } else {
        warn!(logger, "Skipped {} rows", failed.len());

        for row in &failed {
            println!("{}", row.join(","));
        }
    }

    Ok(())
}
