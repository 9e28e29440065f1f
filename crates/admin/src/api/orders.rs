//! Admin order endpoints.

use secrecy::SecretString;
use serde::Deserialize;
use threadline_core::{Order, OrderId, OrderStatus, Paginated, UpdateOrderStatus};
use tracing::instrument;

use super::{ApiClient, ApiError};

/// Filters for the admin order list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OrderListQuery {
    pub page: u32,
    pub status: Option<OrderStatus>,
}

#[derive(Deserialize)]
struct OrderPayload {
    order: Order,
}

impl ApiClient {
    /// List orders across all customers, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, token))]
    pub async fn orders(
        &self,
        token: &SecretString,
        query: OrderListQuery,
    ) -> Result<Paginated<Order>, ApiError> {
        let mut url = self.endpoint(&["admin", "orders"])?;
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("page", &query.page.max(1).to_string());
            if let Some(status) = query.status {
                pairs.append_pair("status", status.as_str());
            }
        }
        self.fetch(self.request(reqwest::Method::GET, url, token))
            .await
    }

    /// Get any order.
    ///
    /// # Errors
    ///
    /// Returns an error if the order is not found or the API request fails.
    #[instrument(skip(self, token), fields(order_id = %id))]
    pub async fn order(&self, token: &SecretString, id: OrderId) -> Result<Order, ApiError> {
        let url = self.endpoint(&["admin", "orders", &id.to_string()])?;
        let payload: OrderPayload = self
            .fetch(self.request(reqwest::Method::GET, url, token))
            .await?;
        Ok(payload.order)
    }

    /// Move an order to a new status, optionally attaching tracking details.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend refuses the transition or the request fails.
    #[instrument(skip(self, token, update), fields(order_id = %id, status = update.status.as_str()))]
    pub async fn update_order_status(
        &self,
        token: &SecretString,
        id: OrderId,
        update: &UpdateOrderStatus,
    ) -> Result<Order, ApiError> {
        let url = self.endpoint(&["admin", "orders", &id.to_string(), "status"])?;
        let payload: OrderPayload = self
            .fetch(self.request(reqwest::Method::PATCH, url, token).json(update))
            .await?;
        Ok(payload.order)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;
    use threadline_core::Tracking;
    use wiremock::matchers::{body_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::super::tests::{client_for, token};
    use super::*;

    fn order_json(status: &str) -> serde_json::Value {
        json!({"id": 9, "orderNumber": "TL-0009", "status": status, "total": "80.00"})
    }

    #[tokio::test]
    async fn test_orders_filters_by_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/admin/orders"))
            .and(query_param("status", "PAID"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": {"orders": [order_json("PAID")]}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server.uri());
        let page = client
            .orders(
                &token(),
                OrderListQuery {
                    page: 1,
                    status: Some(OrderStatus::Paid),
                },
            )
            .await
            .unwrap();
        assert_eq!(page.items.len(), 1);
    }

    #[tokio::test]
    async fn test_status_update_sends_tracking() {
        let server = MockServer::start().await;
        Mock::given(method("PATCH"))
            .and(path("/admin/orders/9/status"))
            .and(body_json(json!({
                "status": "SHIPPED",
                "tracking": {
                    "carrier": "UPS",
                    "trackingNumber": "1Z999",
                    "trackingUrl": null,
                    "estimatedDelivery": null
                }
            })))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"data": {"order": order_json("SHIPPED")}})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server.uri());
        let update = UpdateOrderStatus {
            status: OrderStatus::Shipped,
            tracking: Some(Tracking {
                carrier: Some("UPS".to_string()),
                tracking_number: Some("1Z999".to_string()),
                tracking_url: None,
                estimated_delivery: None,
            }),
        };
        let order = client
            .update_order_status(&token(), OrderId::new(9), &update)
            .await
            .unwrap();
        assert_eq!(order.status, OrderStatus::Shipped);
    }
}
