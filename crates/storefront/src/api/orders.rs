//! Customer order endpoints. All calls require the customer's bearer token.

use secrecy::SecretString;
use serde::Deserialize;
use threadline_core::{CancelOrder, Order, OrderId, Paginated, PlaceOrder};
use tracing::instrument;

use super::{ApiClient, ApiError};

#[derive(Deserialize)]
struct OrderPayload {
    order: Order,
}

impl ApiClient {
    /// List the customer's orders, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, token))]
    pub async fn orders(&self, token: &SecretString, page: u32) -> Result<Paginated<Order>, ApiError> {
        let mut url = self.endpoint(&["payment", "orders"])?;
        url.query_pairs_mut()
            .append_pair("page", &page.max(1).to_string());
        self.fetch(self.request(reqwest::Method::GET, url, Some(token)))
            .await
    }

    /// Get one of the customer's orders.
    ///
    /// # Errors
    ///
    /// Returns an error if the order is not found or the API request fails.
    #[instrument(skip(self, token), fields(order_id = %id))]
    pub async fn order(&self, token: &SecretString, id: OrderId) -> Result<Order, ApiError> {
        let url = self.endpoint(&["payment", "orders", &id.to_string()])?;
        let payload: OrderPayload = self
            .fetch(self.request(reqwest::Method::GET, url, Some(token)))
            .await?;
        Ok(payload.order)
    }

    /// Place an order.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend rejects the order or the request fails.
    #[instrument(skip(self, token, order), fields(lines = order.items.len()))]
    pub async fn place_order(&self, token: &SecretString, order: &PlaceOrder) -> Result<Order, ApiError> {
        let url = self.endpoint(&["payment", "orders"])?;
        let payload: OrderPayload = self
            .fetch(self.request(reqwest::Method::POST, url, Some(token)).json(order))
            .await?;
        Ok(payload.order)
    }

    /// Cancel an order.
    ///
    /// Takes an already validated [`CancelOrder`], so a blank reason can never
    /// reach the network.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend refuses the cancellation or the request fails.
    #[instrument(skip(self, token, request), fields(order_id = %id))]
    pub async fn cancel_order(
        &self,
        token: &SecretString,
        id: OrderId,
        request: &CancelOrder,
    ) -> Result<Option<String>, ApiError> {
        let url = self.endpoint(&["payment", "orders", &id.to_string(), "cancel"])?;
        self.acknowledge(self.request(reqwest::Method::POST, url, Some(token)).json(request))
            .await
    }
}
