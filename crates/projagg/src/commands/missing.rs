//! Missing command: list projects the solution does not reference yet.

use anyhow::Result;
use colored::Colorize;
use projagg_core::{CandidateMember, build_plan};

use crate::cli::TargetArgs;

pub async fn execute(target: &TargetArgs, json: bool) -> Result<()> {
    let missing = find_missing(target)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&missing)?);
        return Ok(());
    }

    println!(
        "{}",
        format!("Missing from {}", target.solution.display()).cyan().bold()
    );
    println!("{}", "─".repeat(50));

    if missing.is_empty() {
        println!("  {}", "✓ none".green());
        return Ok(());
    }

    for candidate in &missing {
        println!("  {}", candidate.full_path.display());
    }
    println!();
    println!("  {} project(s) missing", missing.len().to_string().yellow());

    Ok(())
}

fn find_missing(target: &TargetArgs) -> Result<Vec<CandidateMember>> {
    let plan = build_plan(&target.solution, &target.root)?;
    Ok(plan.missing)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_find_missing() {
        let temp = tempdir().expect("Failed to create temp dir");
        for name in ["A.csproj", "B.vbproj", "C.txt"] {
            std::fs::write(temp.path().join(name), "").expect("write");
        }
        let solution = temp.path().join("All.sln");
        std::fs::write(
            &solution,
            "Project(\"{FAE04EC0-301F-11D3-BF4B-00C04F79EFBC}\") = \"A\", \"A.csproj\", \"{GUID}\"\r\n",
        )
        .expect("write sln");

        let missing = find_missing(&TargetArgs {
            solution,
            root: temp.path().to_path_buf(),
        })
        .expect("find missing");

        let names: Vec<&str> = missing.iter().map(|c| c.file_name.as_str()).collect();
        assert_eq!(names, vec!["B.vbproj"]);
    }

    #[test]
    fn test_find_missing_bad_root() {
        let temp = tempdir().expect("Failed to create temp dir");
        let result = find_missing(&TargetArgs {
            solution: temp.path().join("All.sln"),
            root: temp.path().join("nope"),
        });
        assert!(result.is_err());
    }

    #[test]
    fn test_find_missing_bad_solution_folder() {
        let temp = tempdir().expect("Failed to create temp dir");
        let result = find_missing(&TargetArgs {
            solution: temp.path().join("gone").join("All.sln"),
            root: temp.path().to_path_buf(),
        });

        let err = result.unwrap_err();
        assert!(err.to_string().starts_with("Path not found"));
    }
}
