//! Command-line conventions of the supported toolchains.

use super::BuildStrategy;
use crate::config::BuildMachineSettings;
use crate::core::{BuildTarget, TargetResult};
use crate::errors::Result;
use crate::process::{ProcessCommand, ProcessRunner};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::sync::Arc;

/// Supported toolchain invocation conventions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Toolchain {
    /// GNU make against generated makefiles.
    Make,
    /// Ninja against a generated build.ninja.
    Ninja,
    /// MSBuild against generated `.vcxproj` files.
    MsBuild,
    /// `cmake --build`, generator-agnostic.
    CMake,
}

impl Toolchain {
    /// All toolchains, in registration order.
    pub const ALL: [Self; 4] = [Self::Make, Self::Ninja, Self::MsBuild, Self::CMake];

    /// The profile identifier this toolchain is registered under.
    #[must_use]
    pub fn profile(&self) -> &'static str {
        match self {
            Self::Make => "make",
            Self::Ninja => "ninja",
            Self::MsBuild => "msbuild",
            Self::CMake => "cmake",
        }
    }

    /// The executable invoked.
    #[must_use]
    pub fn program(&self) -> &'static str {
        match self {
            Self::Make => "make",
            Self::Ninja => "ninja",
            Self::MsBuild => "msbuild",
            Self::CMake => "cmake",
        }
    }

    /// Builds the command line for one target.
    #[must_use]
    pub fn command(
        &self,
        target: &BuildTarget,
        workspace: &Path,
        build_type: &str,
        platform: &str,
        jobs: Option<usize>,
    ) -> ProcessCommand {
        let cmd = ProcessCommand::new(self.program(), workspace);
        match self {
            Self::Make | Self::Ninja => {
                let cmd = match jobs {
                    Some(n) => cmd.args(["-j".to_string(), n.to_string()]),
                    None => cmd,
                };
                cmd.arg(&target.name)
            }
            Self::MsBuild => {
                let cmd = cmd
                    .arg(format!("{}.vcxproj", target.name))
                    .arg("/nologo")
                    .arg(format!("/p:Configuration={build_type}"))
                    .arg(format!("/p:Platform={platform}"));
                match jobs {
                    Some(n) => cmd.arg(format!("/m:{n}")),
                    None => cmd,
                }
            }
            Self::CMake => {
                let cmd = cmd
                    .args(["--build", "."])
                    .args(["--target", target.name.as_str()])
                    .args(["--config", build_type]);
                match jobs {
                    Some(n) => cmd.args(["--parallel".to_string(), n.to_string()]),
                    None => cmd,
                }
            }
        }
    }
}

impl fmt::Display for Toolchain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.profile())
    }
}

/// Builds targets by running a toolchain command through a [`ProcessRunner`].
#[derive(Debug, Clone)]
pub struct CommandStrategy {
    toolchain: Toolchain,
    build_type: String,
    platform: String,
    jobs: Option<usize>,
    runner: Arc<dyn ProcessRunner>,
}

impl CommandStrategy {
    /// Creates a strategy for `toolchain` with the given runner.
    #[must_use]
    pub fn new(toolchain: Toolchain, runner: Arc<dyn ProcessRunner>) -> Self {
        Self {
            toolchain,
            build_type: "Release".to_string(),
            platform: "x64".to_string(),
            jobs: None,
            runner,
        }
    }

    /// Creates a strategy taking build type, platform and jobs from settings.
    #[must_use]
    pub fn from_settings(
        toolchain: Toolchain,
        settings: &BuildMachineSettings,
        runner: Arc<dyn ProcessRunner>,
    ) -> Self {
        Self {
            toolchain,
            build_type: settings.build_type.clone(),
            platform: settings.platform.clone(),
            jobs: settings.jobs,
            runner,
        }
    }

    /// Returns the toolchain.
    #[must_use]
    pub fn toolchain(&self) -> Toolchain {
        self.toolchain
    }

    /// Returns the command that would build `target`.
    #[must_use]
    pub fn command_for(&self, target: &BuildTarget, workspace: &Path) -> ProcessCommand {
        self.toolchain
            .command(target, workspace, &self.build_type, &self.platform, self.jobs)
    }
}

#[async_trait]
impl BuildStrategy for CommandStrategy {
    fn name(&self) -> &str {
        self.toolchain.profile()
    }

    async fn build_target(&self, target: &BuildTarget, workspace: &Path) -> Result<TargetResult> {
        let command = self.command_for(target, workspace);
        let outcome = self.runner.run(&command).await?;
        Ok(TargetResult::from_outcome(target, outcome))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{ProcessOutcome, TargetStatus};
    use crate::testing::ScriptedProcessRunner;
    use pretty_assertions::assert_eq;
    use std::path::PathBuf;

    fn core() -> BuildTarget {
        BuildTarget::new("Core")
    }

    #[test]
    fn test_make_command() {
        let cmd = Toolchain::Make.command(&core(), Path::new("/b"), "Release", "x64", Some(4));
        assert_eq!(cmd.program, "make");
        assert_eq!(cmd.args, vec!["-j", "4", "Core"]);
        assert_eq!(cmd.working_dir, PathBuf::from("/b"));
    }

    #[test]
    fn test_ninja_command_without_jobs() {
        let cmd = Toolchain::Ninja.command(&core(), Path::new("/b"), "Debug", "x64", None);
        assert_eq!(cmd.to_string(), "ninja Core");
    }

    #[test]
    fn test_msbuild_command() {
        let cmd = Toolchain::MsBuild.command(&core(), Path::new("/b"), "Debug", "Win32", Some(2));
        assert_eq!(
            cmd.args,
            vec![
                "Core.vcxproj",
                "/nologo",
                "/p:Configuration=Debug",
                "/p:Platform=Win32",
                "/m:2"
            ]
        );
    }

    #[test]
    fn test_cmake_command() {
        let cmd = Toolchain::CMake.command(&core(), Path::new("/b"), "Release", "x64", None);
        assert_eq!(
            cmd.args,
            vec!["--build", ".", "--target", "Core", "--config", "Release"]
        );
    }

    #[test]
    fn test_profiles_are_distinct() {
        let mut profiles: Vec<_> = Toolchain::ALL.iter().map(Toolchain::profile).collect();
        profiles.dedup();
        assert_eq!(profiles.len(), Toolchain::ALL.len());
        assert_eq!(Toolchain::MsBuild.to_string(), "msbuild");
    }

    #[tokio::test]
    async fn test_strategy_runs_command_in_workspace() {
        let runner = Arc::new(ScriptedProcessRunner::new());
        runner.push_outcome(ProcessOutcome::success().with_duration_seconds(1.5));

        let settings = BuildMachineSettings::new("/code", "/build", "make").with_jobs(8);
        let strategy = CommandStrategy::from_settings(Toolchain::Make, &settings, runner.clone());

        let result = strategy.build_target(&core(), Path::new("/build")).await.unwrap();

        assert_eq!(result.status, TargetStatus::Succeeded);
        assert_eq!(result.step.duration_seconds, 1.5);
        let calls = runner.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].to_string(), "make -j 8 Core");
        assert_eq!(calls[0].working_dir, PathBuf::from("/build"));
    }

    #[tokio::test]
    async fn test_strategy_propagates_runner_error() {
        let runner = Arc::new(ScriptedProcessRunner::new());
        runner.push_spawn_error("make not installed");
        let strategy = CommandStrategy::new(Toolchain::Make, runner);

        let err = strategy.build_target(&core(), Path::new("/build")).await.unwrap_err();
        assert!(err.to_string().contains("make not installed"));
    }
}
