//! Integration tests for push, pull, restore and add

mod support;

use ctfkit_core::Error;
use ctfkit_core::challenge::ChallengeDefinition;
use ctfkit_core::batch::SilentReporter;
use ctfkit_core::commands::{
    AddCommand, AddOptions, PullCommand, PullOptions, PushAction, PushCommand, PushOptions,
    RestoreCommand, RestoreOptions,
};
use ctfkit_core::git::PullStrategy;
use ctfkit_core::selector::ChallengeSelector;

use support::{FakePlatform, Project, ScriptedRunner};

const CHAL_B_URL: &str = "https://git.example.com/event/chal-b.git";
const GAMMA_URL: &str = "https://git.example.com/event/gamma.git";

fn mixed_project() -> Project {
    Project::new()
        .local("chal-a", "Chal A")
        .git("chal-b", "Chal B", CHAL_B_URL)
}

#[test]
fn push_only_moves_git_sourced_challenges() {
    let project = mixed_project();
    let runner = ScriptedRunner::new();
    runner.on("status --porcelain", 0, " M challenge.yml\n");
    let ctx = project.context(&runner, &FakePlatform::new());
    let config_before = project.config_text();

    let report = PushCommand::new(&ctx, &SilentReporter)
        .execute(&PushOptions::default())
        .expect("push runs");

    assert_eq!(report.len(), 2);
    assert_eq!(report.failed_names(), vec!["Chal A"]);
    assert!(matches!(
        report.failed().next(),
        Some((_, Error::NotGitSourced { .. }))
    ));
    let pushed: Vec<_> = report.succeeded().collect();
    assert_eq!(pushed, vec![("Chal B", &PushAction::Pushed)]);
    assert_eq!(report.exit_code(), 1);

    let commands = runner.commands();
    assert!(commands.iter().all(|line| !line.contains("chal-a")));
    assert!(runner.ran("git commit -m Pushing changes to chal-b"));
    assert!(runner.ran(&format!("git subtree push --prefix chal-b {} main", CHAL_B_URL)));
    // auto-pull follows the push
    assert!(runner.ran(&format!("git subtree pull --prefix chal-b {} main --squash", CHAL_B_URL)));

    assert_eq!(project.config_text(), config_before);
}

#[test]
fn clean_challenge_is_not_pushed() {
    let project = mixed_project();
    let runner = ScriptedRunner::new();
    let ctx = project.context(&runner, &FakePlatform::new());

    let options = PushOptions {
        selector: ChallengeSelector::One("chal-b".into()),
        ..Default::default()
    };
    let report = PushCommand::new(&ctx, &SilentReporter)
        .execute(&options)
        .expect("push runs");

    assert!(report.is_success());
    assert_eq!(report.succeeded().next(), Some(("Chal B", &PushAction::NothingToPush)));
    assert!(!runner.ran("subtree push"));
    assert!(!runner.ran("git commit"));
}

#[test]
fn failed_auto_pull_does_not_fail_the_push() {
    let project = mixed_project();
    let runner = ScriptedRunner::new();
    runner.on("status --porcelain", 0, "?? notes.txt\n");
    runner.on("subtree pull", 1, "");
    let ctx = project.context(&runner, &FakePlatform::new());

    let options = PushOptions {
        selector: ChallengeSelector::One("chal-b".into()),
        ..Default::default()
    };
    let report = PushCommand::new(&ctx, &SilentReporter)
        .execute(&options)
        .expect("push runs");

    assert!(report.is_success());
    assert!(runner.ran("subtree pull"));
}

#[test]
fn no_auto_pull_skips_the_pull() {
    let project = mixed_project();
    let runner = ScriptedRunner::new();
    runner.on("status --porcelain", 0, " M challenge.yml\n");
    let ctx = project.context(&runner, &FakePlatform::new());

    let options = PushOptions {
        selector: ChallengeSelector::One("chal-b".into()),
        no_auto_pull: true,
        quiet: true,
    };
    PushCommand::new(&ctx, &SilentReporter)
        .execute(&options)
        .expect("push runs");

    assert!(runner.ran("subtree push"));
    assert!(!runner.ran("subtree pull"));
}

#[test]
fn pull_fails_local_challenges_and_continues() {
    let project = mixed_project();
    let runner = ScriptedRunner::new();
    let ctx = project.context(&runner, &FakePlatform::new());

    let report = PullCommand::new(&ctx, &SilentReporter)
        .execute(&PullOptions::default())
        .expect("pull runs");

    assert_eq!(report.failed_names(), vec!["Chal A"]);
    assert_eq!(report.succeeded().count(), 1);
    let pull = runner
        .calls()
        .into_iter()
        .find(|call| call.display().contains("subtree pull"))
        .expect("chal-b pulled");
    assert!(pull.env.contains(&("GIT_MERGE_AUTOEDIT".to_string(), "no".to_string())));
}

#[test]
fn subrepo_rejects_unknown_strategy_per_item() {
    let project = mixed_project().use_subrepo();
    let runner = ScriptedRunner::new();
    let ctx = project.context(&runner, &FakePlatform::new());

    let options = PullOptions {
        selector: ChallengeSelector::One("chal-b".into()),
        strategy: "octopus".parse().unwrap(),
        quiet: true,
    };
    let report = PullCommand::new(&ctx, &SilentReporter)
        .execute(&options)
        .expect("pull runs");

    assert!(matches!(
        report.failed().next(),
        Some((_, Error::InvalidPullStrategy { .. }))
    ));
    assert!(!runner.ran("subrepo pull"));
}

#[test]
fn missing_subrepo_helper_is_fatal_before_any_change() {
    let project = mixed_project().use_subrepo();
    let runner = ScriptedRunner::new();
    runner.on("subrepo --version", 1, "");
    let ctx = project.context(&runner, &FakePlatform::new());

    let err = PullCommand::new(&ctx, &SilentReporter)
        .execute(&PullOptions {
            strategy: PullStrategy::Rebase,
            ..Default::default()
        })
        .unwrap_err();

    assert!(matches!(err, Error::BackendUnavailable));
    assert_eq!(runner.commands(), vec!["git subrepo --version"]);
}

#[test]
fn definition_file_keys_can_be_pushed_and_pulled() {
    let project = Project::new().register("web/gamma/gamma.yml", GAMMA_URL);
    std::fs::create_dir_all(project.path("web/gamma")).unwrap();
    std::fs::write(
        project.path("web/gamma/gamma.yml"),
        ChallengeDefinition::new("Gamma", "web").to_yaml().unwrap(),
    )
    .unwrap();
    let runner = ScriptedRunner::new();
    runner.on("status --porcelain", 0, " M gamma.yml\n");
    let ctx = project.context(&runner, &FakePlatform::new());

    let pushed = PushCommand::new(&ctx, &SilentReporter)
        .execute(&PushOptions {
            no_auto_pull: true,
            quiet: true,
            ..Default::default()
        })
        .expect("push runs");
    assert!(pushed.is_success());
    assert!(runner.ran(&format!("git subtree push --prefix web/gamma {} main", GAMMA_URL)));

    let pulled = PullCommand::new(&ctx, &SilentReporter)
        .execute(&PullOptions {
            selector: ChallengeSelector::One("web/gamma/gamma.yml".into()),
            quiet: true,
            ..Default::default()
        })
        .expect("pull runs");
    assert!(pulled.is_success());
    assert!(runner.ran(&format!("git subtree pull --prefix web/gamma {} main --squash", GAMMA_URL)));
}

#[test]
fn restore_refuses_existing_directory() {
    let project = mixed_project();
    std::fs::write(project.path("chal-b/solve.py"), "print('x')\n").unwrap();
    let runner = ScriptedRunner::new();
    let ctx = project.context(&runner, &FakePlatform::new());

    let report = RestoreCommand::new(&ctx, &SilentReporter)
        .execute(&RestoreOptions {
            key: Some("chal-b".into()),
            quiet: true,
        })
        .expect("restore runs");

    assert!(matches!(
        report.failed().next(),
        Some((_, Error::UnsupportedRestoreTarget { .. }))
    ));
    assert!(!runner.ran("subtree add"));
    assert!(project.path("chal-b/solve.py").exists());
    assert!(project.path("chal-b/challenge.yml").exists());
}

#[test]
fn restore_re_adds_missing_directory() {
    let project = mixed_project();
    std::fs::remove_dir_all(project.path("chal-b")).unwrap();
    let runner = ScriptedRunner::new();
    let ctx = project.context(&runner, &FakePlatform::new());

    let report = RestoreCommand::new(&ctx, &SilentReporter)
        .execute(&RestoreOptions {
            key: Some("chal-b".into()),
            quiet: true,
        })
        .expect("restore runs");

    assert!(report.is_success());
    assert!(runner.ran(&format!(
        "git subtree add --prefix chal-b {} main --squash",
        CHAL_B_URL
    )));
}

#[test]
fn restore_all_reports_non_git_and_explicit_file_keys() {
    let project = mixed_project().register("web/chal-c/chal.yml", "https://git.example.com/chal-c.git");
    let runner = ScriptedRunner::new();
    let ctx = project.context(&runner, &FakePlatform::new());

    let report = RestoreCommand::new(&ctx, &SilentReporter)
        .execute(&RestoreOptions::default())
        .expect("restore runs");

    let failed: Vec<_> = report.failed().map(|(name, _)| name).collect();
    assert_eq!(failed, vec!["chal-a", "chal-b", "web/chal-c/chal.yml"]);
    assert!(matches!(
        report.entries()[2].outcome,
        Err(Error::UnsupportedRestoreTarget { .. })
    ));
}

#[test]
fn restore_without_added_challenges_is_fatal() {
    let project = Project::new();
    let runner = ScriptedRunner::new();
    let ctx = project.context(&runner, &FakePlatform::new());

    let result = RestoreCommand::new(&ctx, &SilentReporter).execute(&RestoreOptions::default());
    assert!(matches!(result, Err(Error::Project(_))));
    assert!(runner.commands().is_empty());
}

#[test]
fn add_imports_repository_and_commits_registry() {
    let project = Project::new();
    let runner = ScriptedRunner::new();
    let mut ctx = project.context(&runner, &FakePlatform::new());

    let report = AddCommand::new(&mut ctx)
        .execute(&AddOptions {
            repo: "https://git.example.com/event/chal-d.git".into(),
            directory: Some("pwn".into()),
            ..Default::default()
        })
        .expect("add succeeds");

    assert_eq!(report.key.as_str(), "pwn/chal-d");
    assert!(runner.ran("git subtree add --prefix pwn/chal-d https://git.example.com/event/chal-d.git main --squash"));
    assert!(runner.ran("git add .ctf/config.toml"));
    assert!(runner.ran("git commit -m Added pwn/chal-d"));
    assert!(project.config_text().contains("chal-d.git"));
}

#[test]
fn add_registers_existing_directory() {
    let project = Project::new();
    std::fs::create_dir_all(project.path("web/chal-e")).unwrap();
    let runner = ScriptedRunner::new();
    let mut ctx = project.context(&runner, &FakePlatform::new());

    let report = AddCommand::new(&mut ctx)
        .execute(&AddOptions {
            repo: "web/chal-e".into(),
            ..Default::default()
        })
        .expect("add succeeds");

    assert_eq!(report.key.as_str(), "web/chal-e");
    assert!(!report.locator.is_git());
    assert!(runner.commands().is_empty());
    assert!(ctx.registry().contains("web/chal-e"));
}

#[test]
fn add_rejects_unknown_paths() {
    let project = Project::new();
    let runner = ScriptedRunner::new();
    let mut ctx = project.context(&runner, &FakePlatform::new());

    let err = AddCommand::new(&mut ctx)
        .execute(&AddOptions {
            repo: "does-not-exist".into(),
            ..Default::default()
        })
        .unwrap_err();
    assert!(matches!(err, Error::Project(_)));
    assert!(err.to_string().contains("Could not process the challenge path"));
}
