use crate::output::print_json;
use crate::root::{open_desk, require_actor};
use clap::Subcommand;
use std::path::Path;

#[derive(Subcommand)]
pub enum SectorSubcommand {
    /// List registered sectors
    List,
    /// Register a sector
    Add {
        #[arg(required = true)]
        name: Vec<String>,
    },
    /// Remove a sector; tickets and articles keep their label
    Remove {
        #[arg(required = true)]
        name: Vec<String>,
    },
}

pub fn run(
    root: &Path,
    actor: Option<&str>,
    subcmd: SectorSubcommand,
    json: bool,
) -> anyhow::Result<()> {
    let desk = open_desk(root)?;

    let sectors = match subcmd {
        SectorSubcommand::List => desk.sectors()?,
        SectorSubcommand::Add { name } => {
            let name = name.join(" ");
            let sectors = desk.add_sector(require_actor(actor)?, &name)?;
            if !json {
                println!("Sector '{}' registered", name.trim());
            }
            sectors
        }
        SectorSubcommand::Remove { name } => {
            let name = name.join(" ");
            let sectors = desk.remove_sector(require_actor(actor)?, &name)?;
            if !json {
                println!("Sector '{}' removed", name.trim());
            }
            sectors
        }
    };

    if json {
        print_json(&sectors)?;
    } else {
        for s in &sectors {
            println!("  {s}");
        }
    }
    Ok(())
}
