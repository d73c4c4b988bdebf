use anyhow::Result;

use farmdb::{FarmDb, Meters};

use crate::cli::Options;

/// Read the task data, generate inset swaths, write the result.
pub fn run(opts: &Options) -> Result<()> {
    let mut db = FarmDb::read(&opts.input)?;
    println!("{} customers", db.customers.len());
    println!("{} farms", db.farms.len());
    println!("{} fields", db.fields.len());

    db.inset(&opts.name, Meters::from_feet(opts.inset_feet))?;

    db.write(&opts.output)?;
    Ok(())
}
