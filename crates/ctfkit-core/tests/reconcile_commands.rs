//! Integration tests for install, sync, verify and mirror

mod support;

use ctfkit_core::Error;
use ctfkit_core::batch::SilentReporter;
use ctfkit_core::challenge::{FlagSpec, IgnoreSet, RemoteFlag};
use ctfkit_core::commands::{
    FormatCommand, FormatOptions, InstallAction, InstallCommand, InstallOptions, MirrorAction,
    MirrorCommand, MirrorOptions, SyncCommand, SyncOptions, VerifyCommand, VerifyOptions,
    VerifyOutcome,
};
use ctfkit_core::selector::ChallengeSelector;

use support::{FakePlatform, Project, ScriptedRunner};

fn install_all(project: &Project, platform: &std::sync::Arc<FakePlatform>) {
    let ctx = project.context(&ScriptedRunner::new(), platform);
    let report = InstallCommand::new(&ctx, &SilentReporter)
        .execute(&InstallOptions {
            quiet: true,
            ..Default::default()
        })
        .expect("install runs");
    assert!(report.is_success());
}

#[test]
fn install_creates_absent_challenges() {
    let project = Project::new().local("web/alpha", "Alpha").local("pwn/beta", "Beta");
    project.edit("web/alpha", |def| {
        def.value = Some(100);
        def.flags = vec![FlagSpec::Plain("flag{alpha}".into())];
    });
    let platform = FakePlatform::new();
    let ctx = project.context(&ScriptedRunner::new(), &platform);

    let report = InstallCommand::new(&ctx, &SilentReporter)
        .execute(&InstallOptions::default())
        .expect("install runs");

    assert!(report.is_success());
    assert!(report
        .succeeded()
        .all(|(_, action)| matches!(action, InstallAction::Created(_))));
    let alpha = platform.get("Alpha").expect("alpha installed");
    assert_eq!(alpha.value, Some(100));
    assert_eq!(alpha.flags[0].content, "flag{alpha}");
    assert_eq!(alpha.state, "visible");
}

#[test]
fn install_conflicts_with_existing_challenge_unless_forced() {
    let project = Project::new().local("web/alpha", "Alpha");
    project.edit("web/alpha", |def| def.description = Some("new text".into()));
    let platform = FakePlatform::new();
    platform.seed("Alpha", "misc");
    let ctx = project.context(&ScriptedRunner::new(), &platform);

    let report = InstallCommand::new(&ctx, &SilentReporter)
        .execute(&InstallOptions::default())
        .expect("install runs");
    assert!(matches!(
        report.failed().next(),
        Some((_, Error::RemoteConflict { .. }))
    ));
    assert_eq!(platform.writes(), 0);

    let report = InstallCommand::new(&ctx, &SilentReporter)
        .execute(&InstallOptions {
            force: true,
            ..Default::default()
        })
        .expect("install runs");
    assert_eq!(report.succeeded().next(), Some(("Alpha", &InstallAction::Synced)));
    assert_eq!(platform.get("Alpha").unwrap().description, "new text");
    assert_eq!(platform.names(), vec!["Alpha"]);
}

#[test]
fn hidden_install_sets_state() {
    let project = Project::new().local("web/alpha", "Alpha");
    let platform = FakePlatform::new();
    let ctx = project.context(&ScriptedRunner::new(), &platform);

    InstallCommand::new(&ctx, &SilentReporter)
        .execute(&InstallOptions {
            hidden: true,
            ..Default::default()
        })
        .expect("install runs");

    assert_eq!(platform.get("Alpha").unwrap().state, "hidden");
}

#[test]
fn sync_batch_continues_after_missing_challenge() {
    let project = Project::new().local("web/alpha", "Alpha").local("pwn/beta", "Beta");
    project.edit("pwn/beta", |def| def.value = Some(300));
    let platform = FakePlatform::new();
    platform.seed("Beta", "misc");
    let ctx = project.context(&ScriptedRunner::new(), &platform);

    let report = SyncCommand::new(&ctx, &SilentReporter)
        .execute(&SyncOptions::default())
        .expect("sync runs");

    assert_eq!(report.len(), 2);
    assert_eq!(report.failed_names(), vec!["Alpha"]);
    assert!(matches!(
        report.failed().next(),
        Some((_, Error::RemoteMissing { .. }))
    ));
    assert_eq!(platform.get("Beta").unwrap().value, Some(300));
    assert_eq!(report.exit_code(), 1);
}

#[test]
fn sync_with_deploy_ignore_set_leaves_those_fields_alone() {
    let project = Project::new().local("web/alpha", "Alpha");
    project.edit("web/alpha", |def| {
        def.description = Some("updated".into());
        def.flags = vec![FlagSpec::Plain("flag{local}".into())];
        def.tags = vec!["local".into()];
        def.state = Some("hidden".into());
    });
    let platform = FakePlatform::new();
    platform.seed("Alpha", "misc");
    let remote_flag = RemoteFlag {
        kind: "static".into(),
        content: "flag{remote}".into(),
        data: None,
    };
    platform.modify("Alpha", |remote| {
        remote.flags = vec![remote_flag.clone()];
        remote.tags = vec!["remote".into()];
    });
    let ctx = project.context(&ScriptedRunner::new(), &platform);

    let report = SyncCommand::new(&ctx, &SilentReporter)
        .execute(&SyncOptions {
            ignore: IgnoreSet::deploy(),
            ..Default::default()
        })
        .expect("sync runs");

    assert!(report.is_success());
    let alpha = platform.get("Alpha").unwrap();
    assert_eq!(alpha.description, "updated");
    assert_eq!(alpha.flags, vec![remote_flag]);
    assert_eq!(alpha.tags, vec!["remote".to_string()]);
    assert_eq!(alpha.state, "visible");
}

#[test]
fn verify_is_read_only_and_idempotent() {
    let project = Project::new().local("web/alpha", "Alpha").local("pwn/beta", "Beta");
    let platform = FakePlatform::new();
    install_all(&project, &platform);
    platform.modify("Beta", |remote| remote.description = "changed remotely".into());

    let ctx = project.context(&ScriptedRunner::new(), &platform);
    let definition_before = std::fs::read_to_string(project.path("pwn/beta/challenge.yml")).unwrap();
    let writes_before = platform.writes();

    let first = VerifyCommand::new(&ctx, &SilentReporter)
        .execute(&VerifyOptions::default())
        .expect("verify runs");
    let second = VerifyCommand::new(&ctx, &SilentReporter)
        .execute(&VerifyOptions::default())
        .expect("verify runs");

    assert_eq!(first.in_sync(), vec!["Alpha"]);
    assert_eq!(first.out_of_sync(), vec!["Beta"]);
    assert_eq!(first.in_sync(), second.in_sync());
    assert_eq!(first.out_of_sync(), second.out_of_sync());
    assert_eq!(platform.writes(), writes_before);
    assert_eq!(
        std::fs::read_to_string(project.path("pwn/beta/challenge.yml")).unwrap(),
        definition_before
    );
}

#[test]
fn verify_ignores_requested_fields() {
    let project = Project::new().local("web/alpha", "Alpha");
    let platform = FakePlatform::new();
    install_all(&project, &platform);
    platform.modify("Alpha", |remote| remote.state = "hidden".into());
    let ctx = project.context(&ScriptedRunner::new(), &platform);

    let strict = VerifyCommand::new(&ctx, &SilentReporter)
        .execute(&VerifyOptions::default())
        .unwrap();
    assert_eq!(strict.outcome(), VerifyOutcome::OutOfSync(1));

    let lenient = VerifyCommand::new(&ctx, &SilentReporter)
        .execute(&VerifyOptions {
            ignore: IgnoreSet::parse(["state"]).unwrap(),
            ..Default::default()
        })
        .unwrap();
    assert_eq!(lenient.outcome(), VerifyOutcome::AllInSync);
    assert_eq!(lenient.exit_code(), 0);
}

#[test]
fn verify_exit_code_depends_on_out_of_sync_count() {
    let project = Project::new()
        .local("a", "A")
        .local("b", "B")
        .local("c", "C");
    let platform = FakePlatform::new();
    install_all(&project, &platform);
    let ctx = project.context(&ScriptedRunner::new(), &platform);

    platform.modify("A", |remote| remote.value = Some(1));
    let report = VerifyCommand::new(&ctx, &SilentReporter)
        .execute(&VerifyOptions::default())
        .unwrap();
    assert_eq!(report.outcome(), VerifyOutcome::OutOfSync(1));
    assert_eq!(report.exit_code(), 1);

    platform.modify("B", |remote| remote.value = Some(2));
    let report = VerifyCommand::new(&ctx, &SilentReporter)
        .execute(&VerifyOptions::default())
        .unwrap();
    assert_eq!(report.outcome(), VerifyOutcome::OutOfSync(2));
    assert_eq!(report.exit_code(), 2);
}

#[test]
fn verify_failure_is_distinct_from_out_of_sync() {
    let project = Project::new().local("a", "A").local("b", "B");
    let platform = FakePlatform::new();
    platform.seed("A", "misc");
    let ctx = project.context(&ScriptedRunner::new(), &platform);

    let report = VerifyCommand::new(&ctx, &SilentReporter)
        .execute(&VerifyOptions::default())
        .unwrap();
    assert_eq!(report.outcome(), VerifyOutcome::VerificationFailed);
    assert_eq!(report.exit_code(), 1);
}

#[test]
fn unresolved_registry_keys_fail_without_stopping_the_batch() {
    let project = Project::new()
        .register("ghost", "ghost")
        .local("web/alpha", "Alpha");
    let platform = FakePlatform::new();
    let ctx = project.context(&ScriptedRunner::new(), &platform);

    let report = InstallCommand::new(&ctx, &SilentReporter)
        .execute(&InstallOptions::default())
        .expect("install runs");

    assert_eq!(report.failed_names(), vec!["ghost"]);
    assert!(platform.get("Alpha").is_some());
}

#[test]
fn unresolvable_single_selector_is_fatal() {
    let project = Project::new().local("web/alpha", "Alpha");
    let ctx = project.context(&ScriptedRunner::new(), &FakePlatform::new());

    let err = SyncCommand::new(&ctx, &SilentReporter)
        .execute(&SyncOptions {
            selector: ChallengeSelector::One("web/missing".into()),
            ..Default::default()
        })
        .unwrap_err();
    assert!(matches!(err, Error::SelectorUnresolved { .. }));
}

#[test]
fn mirror_reports_remote_only_challenges() {
    let project = Project::new().local("alpha", "Alpha");
    let platform = FakePlatform::new();
    platform.seed("Alpha", "web");
    platform.modify("Alpha", |remote| remote.description = "from the platform".into());
    platform.seed("Beta", "crypto");
    let mut ctx = project.context(&ScriptedRunner::new(), &platform);

    let mirror = MirrorCommand::new(&mut ctx, &SilentReporter)
        .execute(&MirrorOptions::default())
        .expect("mirror runs");

    assert_eq!(mirror.remote_only, vec!["Beta"]);
    assert_eq!(mirror.report.len(), 1);
    assert_eq!(
        mirror.report.succeeded().next(),
        Some(("Alpha", &MirrorAction::Mirrored))
    );
    let alpha = project.definition("alpha");
    assert_eq!(alpha.description.as_deref(), Some("from the platform"));
    assert_eq!(alpha.category, "web");
    assert!(!project.path("beta").exists());
    assert!(!ctx.registry().contains("beta"));
}

#[test]
fn mirror_create_materializes_remote_only_challenges() {
    let project = Project::new().local("alpha", "Alpha");
    let platform = FakePlatform::new();
    platform.seed("Alpha", "misc");
    platform.seed("Beta", "crypto");
    platform.modify("Beta", |remote| remote.value = Some(250));
    platform.seed_file("Beta", "handout.txt", b"ciphertext");
    let mut ctx = project.context(&ScriptedRunner::new(), &platform);

    let mirror = MirrorCommand::new(&mut ctx, &SilentReporter)
        .execute(&MirrorOptions {
            create: true,
            ..Default::default()
        })
        .expect("mirror runs");

    assert!(mirror.report.is_success());
    let actions: Vec<_> = mirror.report.succeeded().collect();
    assert_eq!(
        actions,
        vec![
            ("Beta", &MirrorAction::Created),
            ("Alpha", &MirrorAction::AlreadyInSync)
        ]
    );

    let beta = project.definition("beta");
    assert_eq!(beta.name, "Beta");
    assert_eq!(beta.value, Some(250));
    assert_eq!(beta.files, vec!["dist/handout.txt".to_string()]);
    assert_eq!(
        std::fs::read(project.path("beta/dist/handout.txt")).unwrap(),
        b"ciphertext"
    );
    assert!(ctx.registry().contains("beta"));
    assert!(project.config_text().contains("beta"));
}

#[test]
fn mirror_single_challenge_does_not_clone_other_registered_challenges() {
    let project = Project::new().local("web/alpha", "Alpha").local("web/beta", "Beta");
    let platform = FakePlatform::new();
    platform.seed("Alpha", "misc");
    platform.seed("Beta", "misc");
    let mut ctx = project.context(&ScriptedRunner::new(), &platform);
    let config_before = project.config_text();

    let mirror = MirrorCommand::new(&mut ctx, &SilentReporter)
        .execute(&MirrorOptions {
            selector: ChallengeSelector::One("web/alpha".into()),
            create: true,
            quiet: true,
            ..Default::default()
        })
        .expect("mirror runs");

    assert!(mirror.remote_only.is_empty());
    assert_eq!(mirror.report.len(), 1);
    assert_eq!(mirror.report.entries()[0].name, "Alpha");
    let keys: Vec<String> = ctx.registry().keys().map(|k| k.to_string()).collect();
    assert_eq!(keys, vec!["web/alpha", "web/beta"]);
    assert!(!project.path("beta").exists());
    assert_eq!(project.config_text(), config_before);
}

#[test]
fn format_rewrites_definitions_in_place() {
    let project = Project::new().local("alpha", "Alpha");
    std::fs::write(
        project.path("alpha/challenge.yml"),
        "category: misc\nname: Alpha\nvalue: 100\n",
    )
    .unwrap();
    let ctx = project.context(&ScriptedRunner::new(), &FakePlatform::new());

    let report = FormatCommand::new(&ctx, &SilentReporter)
        .execute(&FormatOptions::default())
        .expect("format runs");

    assert!(report.is_success());
    let content = std::fs::read_to_string(project.path("alpha/challenge.yml")).unwrap();
    assert!(content.find("name:").unwrap() < content.find("category:").unwrap());
    assert_eq!(project.definition("alpha").value, Some(100));
}
