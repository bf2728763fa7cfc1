// qcscan-cli/src/commands/profiles.rs
//
// Lists the profiles and content filters a run can select.

use crate::cli::ProfilesArgs;
use crate::error::CliResult;
use crate::output::{print_heading, print_info, print_section};
use qcscan_core::QcConfig;
use qcscan_core::processing::Comparison;

pub fn run_profiles(args: ProfilesArgs) -> CliResult<()> {
    let config = match &args.config {
        Some(path) => QcConfig::from_file(path)?,
        None => QcConfig::default(),
    };

    print_heading("Profiles");
    for (name, thresholds) in &config.profiles {
        let checks = thresholds
            .iter()
            .map(|(tag, value)| format!("{tag} {} {value}", Comparison::implicit_for(tag).symbol()))
            .collect::<Vec<_>>()
            .join(", ");
        print_info(name, checks);
    }

    print_section("Content filters");
    for (name, entries) in &config.content_filters {
        let checks = entries
            .iter()
            .map(|(tag, entry)| format!("{tag} {} {}", entry.op.symbol(), entry.threshold))
            .collect::<Vec<_>>()
            .join(" and ");
        print_info(name, checks);
    }
    Ok(())
}
