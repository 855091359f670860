//! Check command: load the entry and list packages in dependency order

use able_loader::Program;
use tracing::info;

use super::{load_program, CommandContext};
use crate::output::colors::ColorSupport;
use crate::LoadArgs;

/// Execute the check command
pub fn execute(args: &LoadArgs, json: bool, ctx: &CommandContext) -> anyhow::Result<()> {
    let program = load_program(args, ctx)?;
    info!(
        "Loaded {} packages from {} files",
        program.modules.len(),
        program.file_count()
    );

    if json {
        ctx.output.print(&serde_json::to_string_pretty(&program.summary())?);
    } else {
        ctx.output.print(&render_check(&program, ctx.output.colors()));
        ctx.output.success(&format!(
            "Loaded {} packages from {} files",
            program.modules.len(),
            program.file_count()
        ));
    }
    Ok(())
}

/// One line per package: name, root kind, file count and markers
pub fn render_check(program: &Program, colors: &ColorSupport) -> String {
    program
        .modules
        .iter()
        .map(|module| {
            let mut line = format!(
                "{} {}",
                colors.cyan(&module.name),
                colors.dim(&format!(
                    "({}, {} file{})",
                    module.origin.kind,
                    module.files.len(),
                    if module.files.len() == 1 { "" } else { "s" }
                ))
            );
            if module.is_private() {
                line.push_str(" private");
            }
            if module.name == program.entry.name {
                line.push_str(" entry");
            }
            line
        })
        .collect::<Vec<_>>()
        .join("\n")
}
