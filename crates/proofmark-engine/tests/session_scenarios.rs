use proofmark_engine::{
    AnnotationKind, FindingPattern, Intent, PointerEvent, Session, SessionConfig,
    create_session, format_decorations,
};
use pretty_assertions::assert_eq;

fn fixture(name: &str) -> String {
    std::fs::read_to_string(format!(
        "{}/tests/fixtures/{name}.txt",
        env!("CARGO_MANIFEST_DIR")
    ))
    .unwrap()
}

fn dump(session: &Session) -> String {
    format_decorations(session.decorations(), &session.document().text())
}

#[test]
fn fixture_letter_initial_scan() {
    let session = create_session(&fixture("letter"));

    assert_eq!(session.document().text(), fixture("letter"));
    insta::assert_snapshot!(dump(&session), @r#"
    SpellingUnderline [18..25] "recieve"
    GrammarUnderline [51..59] "could of"
    SpellingUnderline [83..86] "teh"
    "#);
}

#[test]
fn fixture_boundaries_only_whole_words() {
    let session = Session::new(
        &fixture("boundaries"),
        SessionConfig {
            patterns: vec![FindingPattern::grammar("has", "have")],
            ..SessionConfig::default()
        },
    );

    insta::assert_snapshot!(dump(&session), @r#"GrammarUnderline [9..12] "has""#);
}

#[test]
fn accept_then_keep_editing() {
    let mut session = create_session(&fixture("letter"));

    let hover = session.on_hover(&PointerEvent::Text { offset: 20 }).unwrap();
    assert_eq!(hover.kind, AnnotationKind::Spelling);
    assert_eq!(hover.matched_text, "recieve");
    assert_eq!(hover.suggestion, "receive");
    assert_eq!(hover.explanation, "i before e, except after c");
    assert_eq!(hover.context_snippet, "I will recieve the package tomorrow.");

    let patch = session.handle(Intent::Accept(hover.id)).unwrap().unwrap();
    assert_eq!(patch.version, 1);
    assert_eq!(session.hovered(), None);

    // insert ahead of everything: all remaining findings move by the inserted length
    session.apply_edit(0..0, "Hi. ").unwrap();
    insta::assert_snapshot!(dump(&session), @r#"
    GrammarUnderline [55..63] "could of"
    SpellingUnderline [87..90] "teh"
    "#);
    assert_eq!(session.version(), 2);
}

#[test]
fn edit_inside_finding_drops_it() {
    let mut session = Session::new(
        &fixture("letter"),
        SessionConfig {
            rescan_on_edit: false,
            ..SessionConfig::default()
        },
    );

    // "could of" -> "could have" typed by hand: the finding is stale
    let patch = session.apply_edit(57..59, "have").unwrap();
    assert_eq!(patch.dropped.len(), 1);
    insta::assert_snapshot!(dump(&session), @r#"
    SpellingUnderline [18..25] "recieve"
    SpellingUnderline [85..88] "teh"
    "#);
}

#[test]
fn ignored_text_stays_ignored_after_edits() {
    let mut session = create_session("teh one, teh two");
    let first = session.annotations().all()[0].id.clone();

    session.handle(Intent::Ignore(first)).unwrap();
    assert!(session.annotations().is_empty());
    assert!(session.decorations().is_empty());

    session.apply_edit(16..16, ", teh three").unwrap();

    assert!(session.annotations().is_empty());
    assert!(session.decorations().is_empty());
}

#[test]
fn streaming_cursor_toggles_widget_only() {
    let mut session = create_session("I will recieve the package.");
    session.set_selection(10..10);

    session.set_streaming(true);
    insta::assert_snapshot!(dump(&session), @r#"
    SpellingUnderline [7..14] "recieve"
    AiCursor @10
    "#);

    session.set_streaming(false);
    insta::assert_snapshot!(dump(&session), @r#"SpellingUnderline [7..14] "recieve""#);
}

#[test]
fn stale_hover_returns_none() {
    let mut session = create_session("teh cat");
    let id = session.annotations().all()[0].id.clone();
    session.dismiss(&id).unwrap();

    assert_eq!(session.on_hover(&PointerEvent::Decoration { id: id.clone() }), None);
    assert!(session.dismiss(&id).is_err());
}
