//! Route pseudo-paths for every backend endpoint the client consumes.
//!
//! The backend multiplexes everything through one URL; the `route` query
//! parameter selects the handler (`module/controller|action`).

// Account
pub const LOGIN: &str = "extension/mstore/account|login";
pub const REGISTER: &str = "extension/mstore/account|register";
pub const EDIT_ACCOUNT: &str = "extension/mstore/account|edit";

// Address book
pub const ADDRESSES: &str = "extension/mstore/shipping_address|addresses";
pub const ADD_ADDRESS: &str = "extension/mstore/shipping_address|add";
pub const EDIT_ADDRESS: &str = "extension/mstore/shipping_address|edit";
pub const DELETE_ADDRESS: &str = "extension/mstore/shipping_address|delete";

// Cart
pub const CART: &str = "extension/mstore/cart";
pub const CART_ADD: &str = "extension/mstore/cart|add";
pub const CART_EDIT: &str = "extension/mstore/cart|edit";
pub const CART_REMOVE: &str = "extension/mstore/cart|remove";
pub const CART_CLEAR: &str = "extension/mstore/cart|emptyCart";

// Checkout steps, in call order
pub const CHECKOUT_BILLING_ADDRESS: &str = "extension/mstore/payment_address|save";
pub const CHECKOUT_SHIPPING_ADDRESS: &str = "extension/mstore/shipping_address|save";
pub const CHECKOUT_SHIPPING_METHOD: &str = "extension/mstore/shipping_method|save";
pub const CHECKOUT_PAYMENT_METHOD: &str = "extension/mstore/payment_method|save";
pub const CHECKOUT_CONFIRM: &str = "extension/mstore/confirm|confirm";

// Orders
pub const ORDER_HISTORY: &str = "extension/mstore/order|all";

// Catalog
pub const PRODUCTS: &str = "extension/mstore/products";
pub const PRODUCT_DETAIL: &str = "extension/mstore/products|detail";
pub const MENU: &str = "extension/mstore/menu";

// Localization
pub const CURRENCIES: &str = "extension/mstore/currency";
pub const CHANGE_CURRENCY: &str = "extension/mstore/currency|change";
pub const COUNTRIES: &str = "extension/mstore/localisation|countries";
pub const ZONES: &str = "extension/mstore/localisation|zones";
pub const AREAS: &str = "extension/mstore/localisation|areas";
