//! Reconciliation traits implemented for the item API

use crate::client::Client;
use crate::error::Error;
use crate::types::Item;
use declarative::{GetQuery, RemoteApi, RemoteEntity};
use serde_json::{Value, json};

impl RemoteEntity for Item {
    fn remote_id(&self) -> Option<&str> {
        (!self.item_id.is_empty()).then_some(self.item_id.as_str())
    }

    fn set_remote_id(&mut self, id: &str) {
        self.item_id = id.to_string();
    }
}

/// `item.get` parameters for a query
pub fn get_params(query: &GetQuery) -> Value {
    let mut params = json!({
        "itemids": query.ids,
        "output": "extend",
    });
    if query.expand_sub_resources {
        params["selectPreprocessing"] = json!("extend");
    }
    params
}

impl RemoteApi for Client {
    type Entity = Item;
    type Error = Error;

    fn create(&self, batch: &[Item]) -> Result<Vec<String>, Error> {
        self.items_create(batch)
    }

    fn get(&self, query: &GetQuery) -> Result<Vec<Item>, Error> {
        self.items_get(&get_params(query))
    }

    fn update(&self, batch: &[Item]) -> Result<Vec<String>, Error> {
        self.items_update(batch)
    }

    fn delete(&self, ids: &[String]) -> Result<Vec<String>, Error> {
        self.items_delete(ids)
    }
}
