use vergen_gitcl::{BuildBuilder, CargoBuilder, Emitter, GitclBuilder, RustcBuilder};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let build = BuildBuilder::all_build()?;
    let cargo = CargoBuilder::all_cargo()?;
    let rustc = RustcBuilder::all_rustc()?;

    let mut emitter = Emitter::default();
    emitter
        .add_instructions(&build)?
        .add_instructions(&cargo)?
        .add_instructions(&rustc)?;

    // Release tarballs and container builds have no .git; take the values from the environment
    if let Ok(git) = GitclBuilder::all_git() {
        emitter.add_instructions(&git)?;
    } else {
        for var in [
            "VERGEN_GIT_SHA",
            "VERGEN_GIT_COMMIT_TIMESTAMP",
            "VERGEN_GIT_DIRTY",
        ] {
            let fallback = if var == "VERGEN_GIT_DIRTY" { "false" } else { "unknown" };
            println!(
                "cargo::rustc-env={}={}",
                var,
                std::env::var(var).unwrap_or_else(|_| fallback.to_string())
            );
        }
    }

    emitter.emit()?;

    Ok(())
}
