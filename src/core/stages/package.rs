//! Archive creation through the external archiver (7z command-line contract).

use crate::config::PublishConfig;
use crate::error::Result;
use crate::layout::ReleaseLayout;
use crate::process::Invocation;
use crate::utils::io;

use super::{tool, Stage, StageContext, StageId, StageOutcome, StagePlan};

/// `-ir!<target>/*`: include the package tree recursively.
fn include_tree(layout: &ReleaseLayout) -> String {
    format!("-ir!{}", layout.target.join("*").display())
}

pub fn primary_invocation(config: &PublishConfig, layout: &ReleaseLayout) -> Invocation {
    let primary = &config.compression.primary;
    let mut invocation = tool(config, &config.tools.archiver)
        .arg("a")
        .arg(layout.archive.display().to_string())
        .arg("-tzip")
        .arg(include_tree(layout));

    if primary.multithreaded {
        invocation = invocation.arg("-mmt=on");
    }

    invocation.args([
        format!("-mm={}", primary.method),
        format!("-md={}", primary.dictionary_size),
        format!("-mfb={}", primary.fast_bytes),
        format!("-mlc={}", primary.literal_context_bits),
    ])
}

pub fn light_invocation(config: &PublishConfig, layout: &ReleaseLayout) -> Invocation {
    let light = &config.compression.light;
    tool(config, &config.tools.archiver)
        .arg("a")
        .arg(layout.light_archive.display().to_string())
        .arg("-tzip")
        .arg(include_tree(layout))
        .args(light.exclude.iter().map(|pattern| format!("-x!{}", pattern)))
        .arg(format!("-mm={}", light.method))
}

/// Maximum-ratio archive of the whole package tree.
pub struct PackagePrimaryStage;

impl Stage for PackagePrimaryStage {
    fn id(&self) -> StageId {
        StageId::PackagePrimary
    }

    fn run(&self, ctx: &mut StageContext<'_>) -> Result<StageOutcome> {
        // `7z a` updates an existing archive in place.
        io::remove_file_if_exists(&ctx.layout.archive, "remove previous archive")?;
        ctx.run(&primary_invocation(ctx.config, ctx.layout))?;
        Ok(StageOutcome::done())
    }

    fn plan(&self, config: &PublishConfig, layout: &ReleaseLayout) -> StagePlan {
        StagePlan::commands(&[primary_invocation(config, layout)]).path(&layout.archive)
    }
}

/// Smaller archive without the search index and bulk card data.
pub struct PackageLightStage;

impl Stage for PackageLightStage {
    fn id(&self) -> StageId {
        StageId::PackageLight
    }

    fn run(&self, ctx: &mut StageContext<'_>) -> Result<StageOutcome> {
        io::remove_dir_if_exists(&ctx.layout.light_dir, "clear light archive directory")?;
        io::ensure_dir(&ctx.layout.light_dir, "create light archive directory")?;
        ctx.run(&light_invocation(ctx.config, ctx.layout))?;
        Ok(StageOutcome::done())
    }

    fn plan(&self, config: &PublishConfig, layout: &ReleaseLayout) -> StagePlan {
        StagePlan::commands(&[light_invocation(config, layout)]).path(&layout.light_archive)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stages::testing::{layout_at, run_stage, RecordingRunner};
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn primary_archive_uses_lzma_settings() {
        let dir = TempDir::new().unwrap();
        let (config, layout) = layout_at(dir.path());

        let invocation = primary_invocation(&config, &layout);
        assert_eq!(invocation.program, "7z");
        assert_eq!(
            invocation.args,
            vec![
                "a".to_string(),
                layout.archive.display().to_string(),
                "-tzip".to_string(),
                format!("-ir!{}/*", layout.target.display()),
                "-mmt=on".to_string(),
                "-mm=LZMA".to_string(),
                "-md=64m".to_string(),
                "-mfb=64".to_string(),
                "-mlc=8".to_string(),
            ]
        );
    }

    #[test]
    fn light_archive_excludes_bulk_data() {
        let dir = TempDir::new().unwrap();
        let (config, layout) = layout_at(dir.path());
        let runner = RecordingRunner::default();

        run_stage(&PackageLightStage, &config, &layout, &runner).unwrap();

        assert!(layout.light_dir.is_dir());
        let calls = runner.calls.borrow();
        assert_eq!(
            calls[0].args,
            vec![
                "a".to_string(),
                layout.version_root.join("deflate/Mtgdb.Gui.zip").display().to_string(),
                "-tzip".to_string(),
                format!("-ir!{}/*", layout.target.display()),
                "-x!data/index/*".to_string(),
                "-x!data/AllPrintings.json".to_string(),
                "-x!data/AllPrices.json".to_string(),
                "-mm=deflate".to_string(),
            ]
        );
    }

    #[test]
    fn rerun_starts_from_fresh_archives() {
        let dir = TempDir::new().unwrap();
        let (config, layout) = layout_at(dir.path());
        fs::create_dir_all(&layout.light_dir).unwrap();
        fs::write(&layout.archive, b"previous run").unwrap();
        fs::write(&layout.light_archive, b"previous run").unwrap();
        fs::write(layout.light_dir.join("stale.txt"), b"old").unwrap();
        let runner = RecordingRunner::default();

        run_stage(&PackagePrimaryStage, &config, &layout, &runner).unwrap();
        run_stage(&PackageLightStage, &config, &layout, &runner).unwrap();

        assert!(!layout.archive.exists());
        assert!(!layout.light_archive.exists());
        assert!(layout.light_dir.is_dir());
        assert!(!layout.light_dir.join("stale.txt").exists());
        assert_eq!(runner.calls.borrow().len(), 2);
    }

    #[test]
    fn single_threaded_primary_omits_mmt_switch() {
        let dir = TempDir::new().unwrap();
        let (mut config, layout) = layout_at(dir.path());
        config.compression.primary.multithreaded = false;

        let invocation = primary_invocation(&config, &layout);
        assert!(!invocation.args.iter().any(|a| a == "-mmt=on"));
    }
}
