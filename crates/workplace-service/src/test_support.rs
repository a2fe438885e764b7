//! Gateway mock and payload fixtures shared by the service tests.

use async_trait::async_trait;
use mockall::mock;
use serde_json::json;
use workplace_core::CommentOrder;
use workplace_gateway::WorkplaceGateway;

mock! {
    pub Gateway {}

    #[async_trait]
    impl WorkplaceGateway for Gateway {
        async fn posts_from_group(&self, group_id: &str, limit: Option<u32>) -> Option<String>;
        async fn all_groups(&self) -> Option<String>;
        async fn post_comments(
            &self,
            post_id: &str,
            limit: Option<u32>,
            order: Option<CommentOrder>,
        ) -> Option<String>;
        async fn profile_info(&self, users: &[String]) -> Option<String>;
    }
}

pub const T1: &str = "2017-04-24T22:30:39+0000";
pub const T2: &str = "2017-04-24T23:30:39+0000";

pub fn posts_body() -> String {
    json!({
        "data": [{
            "id": "1213179605391598",
            "message": "<p>Lorem ipsum dolor sit amet, consectetuer adipiscing elit. Aenean commodo ligula eget <span>dolor.</span></p>",
            "permalink_url": "https://testorg.facebook.com/groups/1234/permalink/1234/",
            "created_time": T1,
            "type": "status",
            "from": {
                "name": "Test User",
                "picture": {"data": {"url": "https://scontent.xx.fbcdn.net/v/t1.0-1/p50x50/1234.png"}},
                "link": "https://testorg.facebook.com/app_scoped_user_id/1234/"
            }
        }]
    })
    .to_string()
}

pub fn comments_body(order: CommentOrder) -> String {
    let comment = |created: &str| {
        json!({
            "id": "123123123123",
            "created_time": created,
            "message": "Test comment",
            "from": {
                "name": "Test User",
                "link": "https://testorg.facebook.com/app_scoped_user_id/1234/",
                "id": "1234"
            }
        })
    };

    let data = match order {
        CommentOrder::Chronological => vec![comment(T1), comment(T2)],
        CommentOrder::ReverseChronological => vec![comment(T2), comment(T1)],
    };
    json!({ "data": data }).to_string()
}

pub fn groups_body() -> String {
    json!({
        "data": [
            {"id": "1234533", "name": "Group One"},
            {"id": "3456673", "name": "Group Two"},
            {"id": "5667854", "name": "Group Three"}
        ]
    })
    .to_string()
}

pub fn profiles_body() -> String {
    json!([
        {
            "code": 200,
            "headers": [{"name": "Access-Control-Allow-Origin", "value": "*"}],
            "body": "{\"id\":\"63232\",\"link\":\"https://org.facebook.com/app_scoped_user_id/63232\"}"
        },
        {
            "code": 400,
            "body": {
                "error": {
                    "message": "(#100) Tried accessing nonexisting field",
                    "type": "OAuthException",
                    "code": 100
                }
            }
        }
    ])
    .to_string()
}
