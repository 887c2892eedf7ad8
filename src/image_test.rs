use super::*;
use crate::test_helpers::{LoadEvent, ScriptedLoader};

fn cache() -> ImageCache<ScriptedLoader> {
    ImageCache::new(ScriptedLoader::new().with_image("https://cdn.test/a.png", 100.0, 50.0))
}

#[tokio::test]
async fn load_returns_decoded_image() {
    let images = cache();
    let image = images.load("https://cdn.test/a.png").await.unwrap();
    assert_eq!(image.natural_size(), (100.0, 50.0));
    assert!(images.contains("https://cdn.test/a.png"));
    assert_eq!(images.len(), 1);
}

#[tokio::test]
async fn second_load_hits_cache() {
    let images = cache();
    images.load("https://cdn.test/a.png").await.unwrap();
    images.load("https://cdn.test/a.png").await.unwrap();
    assert_eq!(images.loader().calls(), 1);
    assert_eq!(images.loader().events().borrow().len(), 2);
}

#[tokio::test]
async fn failure_is_not_cached() {
    let images = cache();
    let err = images.load("https://cdn.test/missing.png").await.unwrap_err();
    assert!(matches!(err, RenderError::ImageLoad { ref url, .. } if url == "https://cdn.test/missing.png"));
    assert!(err.is_recoverable());
    assert!(images.is_empty());

    assert!(images.load("https://cdn.test/missing.png").await.is_err());
    assert_eq!(images.loader().calls(), 2);
}

#[tokio::test]
async fn empty_url_never_reaches_loader() {
    let images = cache();
    let err = images.load("").await.unwrap_err();
    assert!(matches!(err, RenderError::ImageLoad { .. }));
    assert_eq!(images.loader().calls(), 0);
}

#[tokio::test]
async fn loader_events_bracket_each_load() {
    let images = cache();
    images.load("https://cdn.test/a.png").await.unwrap();
    let events = images.loader().events();
    assert_eq!(
        *events.borrow(),
        vec![LoadEvent::Start("https://cdn.test/a.png".into()), LoadEvent::Finish("https://cdn.test/a.png".into())]
    );
}

#[test]
fn debug_shows_len() {
    let text = format!("{:?}", cache());
    assert!(text.contains("ImageCache"));
    assert!(text.contains("len: 0"));
}
