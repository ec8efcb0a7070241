//! Wire formats
//!
//! Backend responses leave many fields out or null. Defaults are applied here,
//! once, when converting into the core types; nothing past this module sees
//! an optional amount that should have been zero.

use jiff::Timestamp;
use serde::{Deserialize, Serialize, de::DeserializeOwned};

use tiffin::{
    addresses::Address,
    checkout::{CheckoutInfo, Merchant},
    coupons::{Coupon, DiscountType},
    ids::{AddressId, DishId, MerchantId, OrderId},
    lines::CartLine,
    orders::{OrderRequest, PaymentMethod},
    pricing::{Vnd, vnd},
};

use crate::{
    api::{ApiError, Order},
    session::Role,
};

/// Standard response wrapper used by every endpoint.
#[derive(Debug, Deserialize)]
pub(crate) struct Envelope<T> {
    #[serde(default)]
    success: Option<bool>,

    #[serde(default)]
    message: Option<String>,

    data: Option<T>,
}

/// Decode a response body into its payload.
///
/// Non-2xx statuses and `"success": false` bodies become
/// [`ApiError::Rejected`] carrying the backend's message. 401 and 403 become
/// [`ApiError::Unauthorized`].
pub(crate) fn decode<T: DeserializeOwned>(status: u16, body: &str) -> Result<Option<T>, ApiError> {
    if status == 401 || status == 403 {
        return Err(ApiError::Unauthorized);
    }

    if !(200..300).contains(&status) {
        let message = serde_json::from_str::<Envelope<serde_json::Value>>(body)
            .ok()
            .and_then(|envelope| envelope.message)
            .filter(|message| !message.trim().is_empty())
            .unwrap_or_else(|| fallback_message(status, body));

        return Err(ApiError::Rejected { status, message });
    }

    if body.trim().is_empty() {
        return Ok(None);
    }

    let envelope: Envelope<T> = serde_json::from_str(body)
        .map_err(|error| ApiError::UnexpectedResponse(error.to_string()))?;

    if envelope.success == Some(false) {
        return Err(ApiError::Rejected {
            status,
            message: envelope
                .message
                .unwrap_or_else(|| "request was rejected".to_string()),
        });
    }

    Ok(envelope.data)
}

fn fallback_message(status: u16, body: &str) -> String {
    let body = body.trim();

    if body.is_empty() {
        format!("request failed with status {status}")
    } else {
        body.to_string()
    }
}

/// Convert a wire amount, treating a missing value as zero.
fn amount(field: &str, value: Option<i64>) -> Result<Vnd, ApiError> {
    let value = value.unwrap_or(0);

    if value < 0 {
        return Err(ApiError::UnexpectedResponse(format!(
            "{field} is negative ({value})"
        )));
    }

    Ok(vnd(value))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CheckoutInfoDto {
    #[serde(default)]
    merchant: Option<MerchantDto>,

    #[serde(default)]
    items: Vec<CartItemDto>,

    #[serde(default)]
    addresses: Vec<AddressDto>,

    #[serde(default)]
    default_address_id: Option<u64>,

    #[serde(default)]
    discount_amount: Option<i64>,

    #[serde(default)]
    service_fee: Option<i64>,

    #[serde(default)]
    applied_coupon: Option<String>,

    #[serde(default)]
    available_coupons: Vec<CouponDto>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MerchantDto {
    id: u64,

    #[serde(default)]
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CartItemDto {
    dish_id: u64,

    #[serde(default)]
    merchant_id: Option<u64>,

    #[serde(default)]
    dish_name: Option<String>,

    #[serde(default)]
    price: Option<i64>,

    #[serde(default)]
    discount_price: Option<i64>,

    #[serde(default)]
    quantity: Option<u32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct AddressDto {
    id: u64,

    #[serde(default)]
    recipient_name: Option<String>,

    #[serde(default)]
    phone: Option<String>,

    #[serde(default)]
    address_line: Option<String>,

    #[serde(default)]
    is_default: Option<bool>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CouponDto {
    code: String,
    discount_type: DiscountType,

    #[serde(default)]
    discount_value: Option<i64>,

    #[serde(default)]
    min_order_value: Option<i64>,

    #[serde(default)]
    max_discount_amount: Option<i64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ShippingFeeDto {
    shipping_fee: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct OrderDto {
    id: u64,

    #[serde(default)]
    status: Option<String>,

    #[serde(default)]
    total_amount: Option<i64>,

    #[serde(default)]
    created_at: Option<Timestamp>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct OrderRequestDto {
    dish_ids: Vec<u64>,
    address_id: u64,
    payment_method: PaymentMethod,

    #[serde(skip_serializing_if = "Option::is_none")]
    coupon_code: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    notes: Option<String>,

    shipping_fee: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ApplyCouponDto<'a> {
    pub(crate) coupon_code: &'a str,
}

#[derive(Debug, Serialize)]
pub(crate) struct LoginDto<'a> {
    pub(crate) email: &'a str,
    pub(crate) password: &'a str,
}

#[derive(Debug, Deserialize)]
pub(crate) struct LoginResponseDto {
    pub(crate) token: String,

    #[serde(default)]
    pub(crate) role: Option<Role>,
}

impl TryFrom<CheckoutInfoDto> for CheckoutInfo {
    type Error = ApiError;

    fn try_from(dto: CheckoutInfoDto) -> Result<Self, Self::Error> {
        let merchant = dto.merchant.map(|merchant| Merchant {
            id: MerchantId::new(merchant.id),
            name: merchant.name.unwrap_or_default(),
        });

        let fallback_merchant = merchant.as_ref().map_or(MerchantId::new(0), |m| m.id);

        let lines = dto
            .items
            .into_iter()
            .map(|item| item.into_line(fallback_merchant))
            .collect::<Result<Vec<_>, _>>()?;

        let addresses = dto.addresses.into_iter().map(Address::from).collect();

        let available_coupons = dto
            .available_coupons
            .into_iter()
            .map(Coupon::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            merchant,
            lines,
            addresses,
            default_address: dto.default_address_id.map(AddressId::new),
            service_fee: amount("serviceFee", dto.service_fee)?,
            discount_amount: amount("discountAmount", dto.discount_amount)?,
            applied_coupon: dto.applied_coupon.filter(|code| !code.trim().is_empty()),
            available_coupons,
        })
    }
}

impl CartItemDto {
    fn into_line(self, fallback_merchant: MerchantId) -> Result<CartLine, ApiError> {
        let merchant = self.merchant_id.map_or(fallback_merchant, MerchantId::new);

        let discount_price = self
            .discount_price
            .map(|price| amount("discountPrice", Some(price)))
            .transpose()?;

        Ok(CartLine::new(
            DishId::new(self.dish_id),
            merchant,
            amount("price", self.price)?,
            self.quantity.unwrap_or(1),
        )
        .with_name(self.dish_name.unwrap_or_default())
        .with_discount_price(discount_price))
    }
}

impl From<AddressDto> for Address {
    fn from(dto: AddressDto) -> Self {
        Self {
            id: AddressId::new(dto.id),
            recipient: dto.recipient_name.unwrap_or_default(),
            phone: dto.phone.unwrap_or_default(),
            line: dto.address_line.unwrap_or_default(),
            is_default: dto.is_default.unwrap_or(false),
        }
    }
}

impl TryFrom<CouponDto> for Coupon {
    type Error = ApiError;

    fn try_from(dto: CouponDto) -> Result<Self, Self::Error> {
        let max_discount = dto
            .max_discount_amount
            .map(|cap| amount("maxDiscountAmount", Some(cap)))
            .transpose()?;

        Ok(
            Coupon::new(dto.code, dto.discount_type, dto.discount_value.unwrap_or(0))
                .with_min_order_value(amount("minOrderValue", dto.min_order_value)?)
                .with_max_discount(max_discount),
        )
    }
}

impl TryFrom<ShippingFeeDto> for Vnd {
    type Error = ApiError;

    fn try_from(dto: ShippingFeeDto) -> Result<Self, Self::Error> {
        amount("shippingFee", Some(dto.shipping_fee))
    }
}

impl From<OrderDto> for Order {
    fn from(dto: OrderDto) -> Self {
        Self {
            id: OrderId::new(dto.id),
            status: dto.status.unwrap_or_else(|| "PENDING".to_string()),
            total: dto.total_amount.map(vnd),
            created_at: dto.created_at,
        }
    }
}

impl From<&OrderRequest> for OrderRequestDto {
    fn from(request: &OrderRequest) -> Self {
        Self {
            dish_ids: request.dish_ids.iter().copied().map(DishId::get).collect(),
            address_id: request.address_id.get(),
            payment_method: request.payment_method,
            coupon_code: request.coupon_code.clone(),
            notes: request.notes.clone(),
            shipping_fee: request.shipping_fee.to_minor_units(),
        }
    }
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;

    const CHECKOUT_INFO: &str = r#"{
        "success": true,
        "message": "OK",
        "data": {
            "merchant": { "id": 3, "name": "Com Tam Ba Ghien" },
            "items": [
                { "dishId": 1, "dishName": "Com tam suon", "price": 55000, "discountPrice": 50000, "quantity": 2, "subtotal": 1 },
                { "dishId": 2, "merchantId": 3, "price": 15000, "quantity": null }
            ],
            "addresses": [
                { "id": 7, "recipientName": "Thu", "phone": "0901", "addressLine": "12 Pasteur", "isDefault": true },
                { "id": 8 }
            ],
            "defaultAddressId": 7,
            "itemsTotal": 999999,
            "serviceFee": 5000,
            "discountAmount": null,
            "appliedCoupon": "",
            "availableCoupons": [
                { "code": "SUMMER10", "discountType": "PERCENTAGE", "discountValue": 10, "minOrderValue": 100000 }
            ]
        }
    }"#;

    fn checkout_info() -> Result<CheckoutInfo, ApiError> {
        let dto = decode::<CheckoutInfoDto>(200, CHECKOUT_INFO)?.ok_or(ApiError::MissingData)?;

        CheckoutInfo::try_from(dto)
    }

    #[test]
    fn checkout_info_applies_defaults_at_the_boundary() -> TestResult {
        let info = checkout_info()?;

        assert_eq!(info.lines.len(), 2);
        assert_eq!(info.service_fee, vnd(5_000));
        assert_eq!(info.discount_amount, vnd(0));
        assert_eq!(info.applied_coupon, None);
        assert_eq!(info.default_address, Some(AddressId::new(7)));
        assert_eq!(info.available_coupons.len(), 1);

        let second = info.lines.get(1).ok_or("missing second line")?;

        assert_eq!(second.quantity(), 1);
        assert_eq!(second.merchant_id(), MerchantId::new(3));

        Ok(())
    }

    #[test]
    fn wire_subtotal_is_ignored() -> TestResult {
        let info = checkout_info()?;
        let first = info.lines.first().ok_or("missing first line")?;

        assert_eq!(first.subtotal()?, vnd(100_000));

        Ok(())
    }

    #[test]
    fn sparse_address_is_filled_with_defaults() -> TestResult {
        let info = checkout_info()?;
        let sparse = info.addresses.get(1).ok_or("missing address")?;

        assert_eq!(sparse.id, AddressId::new(8));
        assert!(sparse.line.is_empty());
        assert!(!sparse.is_default);

        Ok(())
    }

    #[test]
    fn rejected_envelope_keeps_backend_message() {
        let body = r#"{ "success": false, "message": "Ma giam gia da het han" }"#;

        let result = decode::<CheckoutInfoDto>(200, body);

        assert!(
            matches!(&result, Err(ApiError::Rejected { message, .. }) if message == "Ma giam gia da het han"),
            "unexpected result: {result:?}"
        );
    }

    #[test]
    fn error_status_uses_envelope_message() {
        let body = r#"{ "success": false, "message": "Merchant is closed" }"#;

        let result = decode::<OrderDto>(400, body);

        assert!(
            matches!(&result, Err(ApiError::Rejected { status: 400, message }) if message == "Merchant is closed"),
            "unexpected result: {result:?}"
        );
    }

    #[test]
    fn error_status_without_json_uses_body() {
        let result = decode::<OrderDto>(502, "Bad Gateway");

        assert!(
            matches!(&result, Err(ApiError::Rejected { status: 502, message }) if message == "Bad Gateway"),
            "unexpected result: {result:?}"
        );
    }

    #[test]
    fn unauthorized_statuses_are_mapped() {
        assert!(matches!(
            decode::<OrderDto>(401, ""),
            Err(ApiError::Unauthorized)
        ));
        assert!(matches!(
            decode::<OrderDto>(403, "{}"),
            Err(ApiError::Unauthorized)
        ));
    }

    #[test]
    fn negative_amount_is_rejected() {
        let body = r#"{ "success": true, "data": { "shippingFee": -1 } }"#;

        let result = decode::<ShippingFeeDto>(200, body)
            .and_then(|dto| dto.ok_or(ApiError::MissingData))
            .and_then(Vnd::try_from);

        assert!(matches!(result, Err(ApiError::UnexpectedResponse(_))));
    }

    #[test]
    fn order_request_serializes_backend_field_names() -> TestResult {
        let request = OrderRequest {
            dish_ids: vec![DishId::new(1), DishId::new(2)],
            address_id: AddressId::new(7),
            payment_method: PaymentMethod::VnPay,
            coupon_code: None,
            notes: Some("it cay".to_string()),
            shipping_fee: vnd(18_000),
        };

        let json = serde_json::to_value(OrderRequestDto::from(&request))?;

        assert_eq!(
            json,
            serde_json::json!({
                "dishIds": [1, 2],
                "addressId": 7,
                "paymentMethod": "VNPAY",
                "notes": "it cay",
                "shippingFee": 18000
            })
        );

        Ok(())
    }

    #[test]
    fn order_response_defaults_status() -> TestResult {
        let body = r#"{ "success": true, "data": { "id": 501, "createdAt": "2026-10-15T09:30:00Z" } }"#;

        let order = Order::from(decode::<OrderDto>(200, body)?.ok_or(ApiError::MissingData)?);

        assert_eq!(order.id, OrderId::new(501));
        assert_eq!(order.status, "PENDING");
        assert!(order.created_at.is_some());

        Ok(())
    }
}
