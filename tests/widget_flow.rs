mod common;

use std::sync::Arc;
use std::time::Duration;

use agent_chat_widget::error::SubmitError;
use agent_chat_widget::widget::{Role, Service, StatusPoller};
use common::{ScriptedBackend, mixed_status, widget_with};
use tokio::sync::Notify;

#[tokio::test]
async fn test_submit_appends_user_then_assistant() {
    let backend = Arc::new(ScriptedBackend::new().reply("**hi**"));
    let widget = widget_with(Arc::clone(&backend));

    assert!(!widget.with_view(|v| v.input().disabled));

    let outcome = widget.submit("  **hi**  ").await.expect("submit");
    assert!(outcome.succeeded());

    // The trimmed prompt goes over the wire.
    assert_eq!(backend.received.lock().unwrap().as_slice(), ["**hi**"]);

    widget.with_view(|view| {
        let messages: Vec<_> = view.messages().collect();
        assert_eq!(messages.len(), 2);

        assert_eq!(messages[0].role, Role::User);
        assert_eq!(messages[0].html, "**hi**");
        assert!(!messages[0].html.contains("<strong>"));

        assert_eq!(messages[1].role, Role::Assistant);
        assert!(messages[1].html.contains("<strong>hi</strong>"));

        assert!(view.placeholders().is_empty());
        assert!(!view.input().disabled);
        assert!(view.input().focused);
        assert_eq!(view.input().value, "");
        assert!(view.is_scrolled_to_latest());
    });
}

#[tokio::test]
async fn test_empty_prompt_is_ignored() {
    let backend = Arc::new(ScriptedBackend::new());
    let widget = widget_with(Arc::clone(&backend));

    for prompt in ["", "   ", "\n\t"] {
        assert_eq!(widget.submit(prompt).await.unwrap_err(), SubmitError::EmptyPrompt);
    }

    assert_eq!(backend.prompt_calls(), 0);
    assert!(widget.with_view(|v| v.is_empty()));
    assert!(!widget.is_pending());
}

#[tokio::test]
async fn test_server_error_becomes_system_message() {
    let backend = Arc::new(ScriptedBackend::new().fail(429, Some("rate limited")));
    let widget = widget_with(backend);

    let outcome = widget.submit("buy 1 BTC").await.expect("submit");
    assert!(!outcome.succeeded());
    assert_eq!(outcome.reply.role, Role::System);
    assert_eq!(outcome.reply.content, "Error: rate limited");

    widget.with_view(|view| {
        assert_eq!(view.message_count(), 2);
        assert!(view.placeholders().is_empty());
        assert!(!view.input().disabled);
        assert!(view.input().focused);
    });
}

#[tokio::test]
async fn test_error_without_message_uses_fallback() {
    let backend = Arc::new(ScriptedBackend::new().fail(500, None));
    let widget = widget_with(backend);

    let outcome = widget.submit("hello").await.expect("submit");
    assert_eq!(outcome.reply.content, "Error: Failed to process your request");
}

#[tokio::test]
async fn test_in_flight_state_and_single_flight() {
    let gate = Arc::new(Notify::new());
    let backend = Arc::new(ScriptedBackend::gated(Arc::clone(&gate)).reply("done"));
    let widget = widget_with(Arc::clone(&backend));

    let task = {
        let widget = Arc::clone(&widget);
        tokio::spawn(async move { widget.submit("first").await })
    };

    // Wait until the request is on the wire.
    while backend.prompt_calls() == 0 {
        tokio::task::yield_now().await;
    }

    widget.with_view(|view| {
        assert_eq!(view.message_count(), 1);
        assert_eq!(view.placeholders(), ["loading-1"]);
        assert!(view.input().disabled);
        assert!(!view.input().focused);
    });
    assert!(widget.is_pending());

    // A second submission is refused without touching the page.
    assert_eq!(widget.submit("second").await.unwrap_err(), SubmitError::Busy);
    assert_eq!(backend.prompt_calls(), 1);
    assert_eq!(widget.with_view(|v| v.message_count()), 1);

    gate.notify_one();
    let outcome = task.await.unwrap().expect("submit");
    assert_eq!(outcome.reply.content, "done");

    assert!(!widget.is_pending());
    widget.with_view(|view| {
        assert!(view.placeholders().is_empty());
        assert!(!view.input().disabled);
    });

    // The next submission gets a fresh placeholder id and goes through.
    gate.notify_one();
    widget.submit("third").await.expect("submit");
    assert_eq!(backend.prompt_calls(), 2);
}

#[tokio::test]
async fn test_dropped_submission_restores_input() {
    let gate = Arc::new(Notify::new());
    let backend = Arc::new(ScriptedBackend::gated(gate));
    let widget = widget_with(Arc::clone(&backend));

    let result = tokio::time::timeout(Duration::from_millis(20), widget.submit("hang")).await;
    assert!(result.is_err());

    assert!(!widget.is_pending());
    widget.with_view(|view| {
        assert!(view.placeholders().is_empty());
        assert!(!view.input().disabled);
        assert!(view.input().focused);
        // The optimistic user message stays.
        assert_eq!(view.message_count(), 1);
    });
}

#[tokio::test]
async fn test_begun_submission_shows_state_before_reply() {
    let backend = Arc::new(ScriptedBackend::new().reply("*ok*"));
    let widget = widget_with(Arc::clone(&backend));

    let submission = widget.begin_submit("  hello  ").expect("begin");
    assert_eq!(submission.seq(), 1);
    assert_eq!(submission.placeholder(), "loading-1");
    assert_eq!(submission.user().content, "hello");
    assert_eq!(backend.prompt_calls(), 0);
    widget.with_view(|view| {
        assert_eq!(view.message_count(), 1);
        assert_eq!(view.placeholders(), ["loading-1"]);
        assert!(view.input().disabled);
        assert!(view.input().value.is_empty());
    });
    assert!(matches!(widget.begin_submit("again"), Err(SubmitError::Busy)));

    let outcome = submission.complete().await;
    assert!(outcome.reply.html.contains("<em>ok</em>"));
    widget.with_view(|view| {
        assert_eq!(view.message_count(), 2);
        assert!(view.placeholders().is_empty());
        assert!(!view.input().disabled);
    });
}

#[tokio::test]
async fn test_unstarted_submission_releases_widget() {
    let backend = Arc::new(ScriptedBackend::new());
    let widget = widget_with(Arc::clone(&backend));

    drop(widget.begin_submit("never sent").expect("begin"));

    assert!(!widget.is_pending());
    assert_eq!(backend.prompt_calls(), 0);
    widget.with_view(|view| {
        assert!(view.placeholders().is_empty());
        assert!(!view.input().disabled);
        assert_eq!(view.message_count(), 1);
    });
    widget.begin_submit("next").expect("widget is idle again");
}

#[tokio::test]
async fn test_poll_status_updates_indicators() {
    let backend = Arc::new(ScriptedBackend::new().status(mixed_status()));
    let widget = widget_with(backend);

    widget.poll_status().await.expect("poll");

    widget.with_view(|view| {
        assert_eq!(view.indicators().len(), 3);
        assert_eq!(view.indicator(Service::Crypto), Some(true));
        assert_eq!(view.indicator(Service::Binance), Some(false));
        assert_eq!(view.indicator(Service::OpenAi), Some(true));

        assert_eq!(view.tool_counts().len(), 2);
        assert_eq!(view.tool_count(Service::Crypto), Some(5));
        assert_eq!(view.tool_count(Service::Binance), Some(0));

        assert_eq!(view.model(), Some("gpt-4o"));
        // Status never touches the transcript.
        assert!(view.is_empty());
    });
}

#[tokio::test]
async fn test_failed_poll_keeps_previous_snapshot() {
    let backend = Arc::new(ScriptedBackend::new().status(mixed_status()).status_fail(503));
    let widget = widget_with(backend);

    widget.poll_status().await.expect("first poll");
    assert!(widget.poll_status().await.is_err());

    widget.with_view(|view| {
        assert_eq!(view.indicator(Service::Crypto), Some(true));
        assert_eq!(view.tool_count(Service::Crypto), Some(5));
        assert!(view.is_empty());
    });
}

#[tokio::test]
async fn test_suggestion_sets_input_without_network() {
    let backend = Arc::new(ScriptedBackend::new());
    let widget = widget_with(Arc::clone(&backend));

    widget.set_suggestion("X");

    widget.with_view(|view| {
        assert_eq!(view.input().value, "X");
        assert!(view.input().focused);
        assert!(view.is_empty());
    });
    assert_eq!(backend.prompt_calls(), 0);
    assert_eq!(backend.status_calls(), 0);
}

#[tokio::test]
async fn test_render_message_escapes_user_text_only() {
    let widget = widget_with(Arc::new(ScriptedBackend::new()));

    let user = widget.render_message(Role::User, "<b>**x**</b>");
    assert_eq!(user.html, "&lt;b&gt;**x**&lt;/b&gt;");

    let system = widget.render_message(Role::System, "*note*");
    assert!(system.html.contains("<em>note</em>"));
    assert!(!system.timestamp.is_empty());

    assert!(widget.with_view(|v| v.is_scrolled_to_latest()));
}

#[tokio::test(start_paused = true)]
async fn test_poller_ticks_until_stopped() {
    let backend = Arc::new(ScriptedBackend::new().status(mixed_status()));
    let widget = widget_with(Arc::clone(&backend));

    let poller = StatusPoller::spawn(Arc::clone(&widget), Duration::from_secs(30));

    // First poll runs on start.
    tokio::time::sleep(Duration::from_millis(1)).await;
    assert_eq!(backend.status_calls(), 1);
    assert_eq!(widget.with_view(|v| v.indicator(Service::Crypto)), Some(true));

    tokio::time::sleep(Duration::from_secs(30)).await;
    assert_eq!(backend.status_calls(), 2);

    poller.stop().await;
    tokio::time::sleep(Duration::from_secs(120)).await;
    assert_eq!(backend.status_calls(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_poller_survives_failures() {
    let backend = Arc::new(
        ScriptedBackend::new()
            .status_fail(500)
            .status(mixed_status()),
    );
    let widget = widget_with(Arc::clone(&backend));

    let poller = StatusPoller::spawn(Arc::clone(&widget), Duration::from_secs(30));

    tokio::time::sleep(Duration::from_millis(1)).await;
    assert_eq!(backend.status_calls(), 1);
    assert_eq!(widget.with_view(|v| v.indicator(Service::Crypto)), None);

    tokio::time::sleep(Duration::from_secs(30)).await;
    assert_eq!(backend.status_calls(), 2);
    assert_eq!(widget.with_view(|v| v.indicator(Service::Crypto)), Some(true));

    drop(poller);
    tokio::time::sleep(Duration::from_secs(90)).await;
    assert_eq!(backend.status_calls(), 2);
}
