//! Mock providers shared by the domain unit tests.

use async_trait::async_trait;
use meeting_ai::traits::{account, calendar, notetaker};
use meeting_ai::types::account::{CodeExchange, GrantInfo};
use meeting_ai::types::calendar::{Event, TimeRange};
use meeting_ai::types::notetaker::{Config, Created, Media};
use mockall::mock;

mock! {
    pub Accounts {}

    #[async_trait]
    impl account::Provider for Accounts {
        async fn exchange_code(&self, exchange: CodeExchange) -> Result<GrantInfo, meeting_ai::Error>;
        async fn grant_is_valid(&self, grant_id: &str) -> bool;
        async fn probe_authorization(&self, authorization_url: &str) -> Result<(), meeting_ai::Error>;
    }
}

mock! {
    pub Notetakers {}

    #[async_trait]
    impl notetaker::Provider for Notetakers {
        async fn create_notetaker(&self, grant_id: &str, config: Config) -> Result<Created, meeting_ai::Error>;
        async fn remove_notetaker(&self, grant_id: &str, notetaker_id: &str) -> Result<(), meeting_ai::Error>;
        async fn media(&self, grant_id: &str, notetaker_id: &str) -> Result<Media, meeting_ai::Error>;
        fn provider_id(&self) -> &str;
    }
}

mock! {
    pub Calendar {}

    #[async_trait]
    impl calendar::Provider for Calendar {
        async fn events(&self, grant_id: &str, range: &TimeRange) -> Result<Vec<serde_json::Value>, meeting_ai::Error>;
        async fn event(&self, grant_id: &str, event_id: &str) -> Result<Event, meeting_ai::Error>;
    }
}

pub fn media_at(url: &str) -> Media {
    Media {
        recording_url: Some(url.to_string()),
    }
}
