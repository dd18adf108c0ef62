//! BDD step definitions for the cascading filter feature

use cucumber::{given, then, when};

use watchpost::filter::FilterField;
use watchpost::model::{Comment, Video};
use watchpost::resolver::FilterResolver;

use crate::world::WatchpostWorld;

fn field(name: &str) -> FilterField {
    match name {
        "channel_name" => FilterField::ChannelName,
        "channel_type" => FilterField::ChannelType,
        "ideology" => FilterField::Ideology,
        "video_id" => FilterField::VideoId,
        other => panic!("unknown filter field: {}", other),
    }
}

fn resolver(world: &mut WatchpostWorld) -> &mut FilterResolver {
    let api = world.remote();
    world.resolver.get_or_insert_with(|| FilterResolver::new(api))
}

#[given(expr = "the remote has videos {word}")]
async fn remote_videos(world: &mut WatchpostWorld, ids: String) {
    let videos: Vec<Video> = ids
        .split(',')
        .map(|id| Video {
            video_id: id.to_string(),
            title: Some(format!("Title {}", id)),
            channel_name: None,
            views: None,
            likes: None,
            total_comments: None,
            published_at: None,
        })
        .collect();
    *world.api().videos.lock().await = videos;
}

#[given(expr = "the remote has {int} comment(s)")]
async fn remote_comments(world: &mut WatchpostWorld, count: usize) {
    let comments: Vec<Comment> = (0..count)
        .map(|i| Comment {
            comment_id: format!("c{}", i),
            text: "first".to_string(),
            author_name: None,
            like_count: None,
            published_at: None,
        })
        .collect();
    *world.api().comments.lock().await = comments;
}

#[when("the channel view is resolved")]
async fn channel_view_resolved(world: &mut WatchpostWorld) {
    resolver(world)
        .resolve_channels()
        .await
        .expect("channel view should resolve");
}

#[when("the video view is resolved")]
async fn video_view_resolved(world: &mut WatchpostWorld) {
    resolver(world)
        .resolve_videos()
        .await
        .expect("video view should resolve");
}

#[when(expr = "the video filter {word} is set to {string}")]
async fn set_video_filter(world: &mut WatchpostWorld, name: String, value: String) {
    resolver(world)
        .set_video_filter(field(&name), &value)
        .await
        .expect("video filter should apply");
}

#[when(expr = "the comment filter {word} is set to {string}")]
async fn set_comment_filter(world: &mut WatchpostWorld, name: String, value: String) {
    resolver(world)
        .set_comment_filter(field(&name), &value)
        .await
        .expect("comment filter should apply");
}

#[when(expr = "video {string} is selected in the comment view")]
async fn select_video(world: &mut WatchpostWorld, video_id: String) {
    resolver(world)
        .select_comment_video(&video_id)
        .await
        .expect("video selection should apply");
}

#[then(expr = "{word} were requested {int} time(s)")]
async fn requests_made(world: &mut WatchpostWorld, collection: String, count: usize) {
    let requests = world.api().requests_for(&collection).await;
    assert_eq!(requests.len(), count, "{} requests: {:?}", collection, requests);
}

#[then(expr = "the last {word} request had parameters {string}")]
async fn last_request_params(world: &mut WatchpostWorld, collection: String, expected: String) {
    let requests = world.api().requests_for(&collection).await;
    let last = requests.last().expect("no request made");
    let actual: Vec<String> = last
        .params()
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect();
    assert_eq!(actual.join("&"), expected);
}

#[then(expr = "the video list has {int} video(s)")]
fn video_list_len(world: &mut WatchpostWorld, count: usize) {
    assert_eq!(resolver(world).videos().len(), count);
}

#[then(expr = "the comment view offers {int} video(s)")]
fn candidate_len(world: &mut WatchpostWorld, count: usize) {
    assert_eq!(resolver(world).candidate_videos().len(), count);
}

#[then(expr = "the comment list has {int} comment(s)")]
fn comment_list_len(world: &mut WatchpostWorld, count: usize) {
    assert_eq!(resolver(world).comments().len(), count);
}

#[then("no video is selected")]
fn no_video_selected(world: &mut WatchpostWorld) {
    assert_eq!(resolver(world).selected_video(), None);
}

#[then(expr = "video {string} is selected")]
fn video_selected(world: &mut WatchpostWorld, video_id: String) {
    assert_eq!(resolver(world).selected_video(), Some(video_id.as_str()));
}
