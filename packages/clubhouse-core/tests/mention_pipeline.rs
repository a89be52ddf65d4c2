//! Mention pipeline through the public API.

use clubhouse_core::mention::{segments_to_display_text, segments_to_editable_text};
use clubhouse_core::{
    Condition, InMemoryDirectory, MentionRenderer, MentionTokenizer, Profile, ProfileId,
    SearchConditionBuilder, SearchConditions, Segment,
};

fn jay_directory() -> InMemoryDirectory {
    InMemoryDirectory::with_profiles([
        Profile::new("u1", "jay", "Jay Park"),
        Profile::new("u2", "jaylee", "Jay Lee"),
    ])
}

#[tokio::test]
async fn round_trip_through_render_and_retokenize() {
    let directory = InMemoryDirectory::with_profiles([Profile::new("u1", "alice", "Alice Kim")]);
    let tokenizer = MentionTokenizer::default();

    let stored = tokenizer.tokenize("hi @alice", &directory).await;
    assert_eq!(stored, "hi [mention:u1]");

    let segments = MentionRenderer::new()
        .render_batch(&[stored.as_str()], &directory, None)
        .await
        .remove(0);
    assert_eq!(
        segments,
        vec![
            Segment::Text { text: "hi ".into() },
            Segment::Mention {
                id: ProfileId::new("u1"),
                username: "alice".into(),
            },
        ]
    );

    let again = tokenizer
        .tokenize(&segments_to_display_text(&segments), &directory)
        .await;
    assert_eq!(again, stored);
}

#[tokio::test]
async fn longer_username_does_not_match_prefix_profile() {
    let directory = InMemoryDirectory::with_profiles([Profile::new("u1", "ann", "Ann")]);
    let stored = MentionTokenizer::default().tokenize("@anna", &directory).await;
    assert_eq!(stored, "@anna");
}

#[tokio::test]
async fn stored_text_is_idempotent() {
    let directory = jay_directory();
    let stored = "ping [mention:u1] later";
    assert_eq!(MentionTokenizer::default().tokenize(stored, &directory).await, stored);
}

#[tokio::test]
async fn end_to_end_only_exact_username() {
    let directory = jay_directory();
    let stored = MentionTokenizer::default()
        .tokenize("hello @jay how are you?", &directory)
        .await;
    assert_eq!(stored, "hello [mention:u1] how are you?");
}

#[tokio::test]
async fn rename_is_picked_up_on_render() {
    let directory = jay_directory();
    let stored = MentionTokenizer::default().tokenize("thanks @jay", &directory).await;

    directory.rename(&ProfileId::new("u1"), "jaypark").unwrap();
    let segments = MentionRenderer::new()
        .render_batch(&[stored.as_str()], &directory, None)
        .await
        .remove(0);
    assert_eq!(segments_to_display_text(&segments), "thanks @jaypark");
}

#[tokio::test]
async fn deleted_profile_keeps_token_for_editing() {
    let directory = jay_directory();
    let stored = MentionTokenizer::default().tokenize("cc @jaylee", &directory).await;

    directory.remove(&ProfileId::new("u2"));
    let segments = MentionRenderer::new()
        .render_batch(&[stored.as_str()], &directory, None)
        .await
        .remove(0);
    assert!(matches!(segments.last(), Some(Segment::MissingMention { .. })));
    assert_eq!(segments_to_editable_text(&segments), "cc [mention:u2]");
}

#[tokio::test]
async fn search_prioritizes_profile_matches() {
    let directory = InMemoryDirectory::with_profiles([Profile::new("u1", "ann", "Ann")]);
    assert_eq!(
        SearchConditionBuilder::build("ann", &directory).await,
        SearchConditions::Any(vec![
            Condition::MentionsProfile(ProfileId::new("u1")),
            Condition::ContainsText("ann".into()),
        ])
    );
    assert_eq!(
        SearchConditionBuilder::build("mention", &directory).await,
        SearchConditions::Empty
    );
}
