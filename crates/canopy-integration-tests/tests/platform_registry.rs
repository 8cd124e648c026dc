//! Integration tests for the application registry of a session.

use std::sync::Arc;

use serde_json::json;

use canopy_core::{ApplicationInfo, InstanceId, Widget};
use canopy_events::PlatformEvent;
use canopy_platform::{
    CreateInstance, DetachedPlatform, PlatformHandle, Target, TopBannerViews, UrlScheme,
};
use canopy_shell::ChildApplicationApi;
use canopy_test::{MockMetadataSource, RecordingLauncher, TestShell};

fn shell() -> TestShell {
    TestShell::builder()
        .cdn(MockMetadataSource::new().with_app(ApplicationInfo::new("@youwol/stories", "Stories")))
        .build()
        .unwrap()
}

#[tokio::test]
async fn test_second_focused_instance_demotes_first() {
    let shell = shell();
    let platform = shell.env.platform();

    let first = platform
        .create_instance(CreateInstance::new("@youwol/stories").with_focus(true))
        .await;
    let second = platform
        .create_instance(CreateInstance::new("@youwol/flux").with_focus(true))
        .await;

    assert_eq!(platform.focused_id(), Some(second.instance_id()));
    let running: Vec<InstanceId> = platform
        .running_applications()
        .iter()
        .map(|app| app.instance_id())
        .collect();
    assert_eq!(running, vec![first.instance_id(), second.instance_id()]);
}

#[tokio::test]
async fn test_close_removes_exactly_one_entry() {
    let shell = shell();
    let platform = shell.env.platform();

    let a = platform.register(CreateInstance::new("a"));
    let b = platform.register(CreateInstance::new("b").with_focus(true));
    let c = platform.register(CreateInstance::new("c"));
    b.attach_frame();

    assert!(platform.close(b.instance_id()));
    let running: Vec<InstanceId> = platform
        .running_applications()
        .iter()
        .map(|app| app.instance_id())
        .collect();
    assert_eq!(running, vec![a.instance_id(), c.instance_id()]);
    assert_eq!(platform.focused_id(), None);
    assert!(b.is_terminated());
    assert_eq!(shell.frames.released().len(), 1);
    assert_eq!(shell.frames.released()[0].instance_id, b.instance_id());

    assert!(!platform.close(b.instance_id()));
    assert!(!platform.close(InstanceId::new()));
    assert_eq!(platform.running_applications().len(), 2);
}

#[tokio::test]
async fn test_closing_background_instance_keeps_focus() {
    let shell = shell();
    let platform = shell.env.platform();

    let focused = platform.register(CreateInstance::new("a").with_focus(true));
    let background = platform.register(CreateInstance::new("b"));

    assert!(platform.close(background.instance_id()));
    assert_eq!(platform.focused_id(), Some(focused.instance_id()));
}

#[tokio::test]
async fn test_metadata_feeds_header_and_snippet() {
    let shell = shell();
    let app = shell
        .env
        .platform()
        .create_instance(CreateInstance::new("@youwol/stories").with_title("My stories"))
        .await;

    assert_eq!(app.snippet().latest(), Some(Widget::text("Stories")));
    let header = app.header().latest().unwrap();
    assert_eq!(header.0["title"], "My stories");
    assert_eq!(header.0["innerText"], "Stories");

    let unknown = shell
        .env
        .platform()
        .create_instance(CreateInstance::new("@youwol/ghost"))
        .await;
    assert!(unknown.metadata().latest().is_none());
    assert!(unknown.snippet().latest().is_none());
}

#[tokio::test]
async fn test_expand_opens_instance_in_new_tab() {
    let shell = shell();
    let app = shell.env.platform().register(
        CreateInstance::new("@youwol/stories").with_parameter("id", "raw 1"),
    );

    assert!(shell.env.platform().expand(app.instance_id()).unwrap());
    let opened = shell.launcher.opened();
    assert_eq!(opened.len(), 1);
    assert_eq!(opened[0].1, Target::NewTab);
    assert!(opened[0].0.starts_with("/applications/@youwol/stories/latest?instance-id="));
    assert!(opened[0].0.ends_with("&id=raw+1"));
}

#[tokio::test]
async fn test_child_sets_banner_and_snippet() {
    let shell = shell();
    let app = shell.env.platform().register(CreateInstance::new("@youwol/stories"));
    let child = shell.env.child_api(app.url());

    assert_eq!(child.app_instance_id(), Some(app.instance_id()));
    assert!(child.set_properties(Widget::text("2 open")));
    assert!(shell.env.platform().set_top_banner_views(
        app.instance_id(),
        TopBannerViews::default().with_actions(Widget::text("save")),
    ));

    assert_eq!(app.snippet().latest(), Some(Widget::text("2 open")));
    assert_eq!(app.top_banner_actions().latest(), Some(Widget::text("save")));
    assert!(app.top_banner_user_menu().latest().is_none());
}

#[tokio::test]
async fn test_broadcasts_reach_subscribers() {
    let shell = shell();
    let handle: Arc<dyn PlatformHandle> = shell.env.platform().clone();
    let mut receiver = handle.subscribe_broadcasts();

    let delivered = handle.broadcast_event(PlatformEvent::new("theme", json!({ "dark": true })));
    assert!(delivered >= 1);

    let event = receiver.recv().await.unwrap();
    let broadcast = event.as_broadcast().unwrap();
    assert_eq!(broadcast.topic, "theme");
    assert_eq!(broadcast.payload["dark"], true);
}

#[tokio::test]
async fn test_detached_child_opens_pages() {
    let launcher = Arc::new(RecordingLauncher::new());
    let child = ChildApplicationApi::new(
        None,
        launcher.clone(),
        UrlScheme::default(),
        "/applications/@youwol/explorer/latest",
    );
    assert!(child.is_detached());
    assert!(child.app_instance_id().is_none());

    child
        .platform()
        .create_instance(CreateInstance::new("@youwol/stories"))
        .await
        .unwrap();
    child
        .platform()
        .create_instance(CreateInstance::new("@youwol/flux").with_focus(true))
        .await
        .unwrap();

    assert_eq!(
        launcher.opened(),
        vec![
            ("/applications/@youwol/stories/latest".to_owned(), Target::NewTab),
            ("/applications/@youwol/flux/latest".to_owned(), Target::SameWindow),
        ]
    );
    assert!(child.platform().running_applications().is_empty());
}

#[tokio::test]
async fn test_detached_broadcasts_stay_local() {
    let shell = shell();
    let mut session_events = shell.env.bus().subscribe();
    let detached = DetachedPlatform::new(shell.launcher.clone());
    let mut local = detached.subscribe_broadcasts();

    assert_eq!(detached.broadcast_event(PlatformEvent::new("ping", json!(null))), 1);

    assert_eq!(local.recv().await.unwrap().as_broadcast().unwrap().topic, "ping");
    assert!(session_events.try_recv().is_none());
}
