//! Field maps for the device check-in request.
//!
//! Field numbers follow the public `checkin.proto` used by open-source GMS
//! reimplementations.

use std::sync::LazyLock;

use crate::schema::{FieldDef, Schema};

static CHECKIN_REQUEST: LazyLock<Schema> = LazyLock::new(build_checkin_request);

/// Schema of the top-level check-in request.
pub fn checkin_request_schema() -> &'static Schema {
    &CHECKIN_REQUEST
}

fn build_info() -> Schema {
    Schema::new()
        .field(1, FieldDef::text()) // fingerprint
        .field(2, FieldDef::text()) // hardware
        .field(3, FieldDef::text()) // brand
        .field(4, FieldDef::text()) // radio
        .field(5, FieldDef::text()) // bootloader
        .field(6, FieldDef::text()) // client id
        .field(7, FieldDef::int()) // build time
        .field(9, FieldDef::text()) // device
        .field(10, FieldDef::int()) // sdk version
        .field(11, FieldDef::text()) // model
        .field(12, FieldDef::text()) // manufacturer
        .field(13, FieldDef::text()) // product
        .field(14, FieldDef::boolean()) // ota installed
}

fn event() -> Schema {
    Schema::new()
        .field(1, FieldDef::text()) // tag
        .field(2, FieldDef::text()) // value
        .field(3, FieldDef::int()) // time ms
}

fn checkin() -> Schema {
    Schema::new()
        .field(1, FieldDef::message(build_info()))
        .field(2, FieldDef::int()) // last checkin ms
        .field(3, FieldDef::message(event()).repeated())
        .field(6, FieldDef::text()) // cell operator
        .field(7, FieldDef::text()) // sim operator
        .field(8, FieldDef::text()) // roaming
        .field(9, FieldDef::int()) // user number
}

fn device_config() -> Schema {
    Schema::new()
        .field(1, FieldDef::int()) // touch screen
        .field(2, FieldDef::int()) // keyboard
        .field(3, FieldDef::int()) // navigation
        .field(4, FieldDef::int()) // screen layout
        .field(5, FieldDef::boolean()) // hard keyboard
        .field(6, FieldDef::boolean()) // five-way navigation
        .field(7, FieldDef::int()) // density dpi
        .field(8, FieldDef::int()) // GL ES version
        .field(9, FieldDef::text().repeated()) // shared libraries
        .field(10, FieldDef::text().repeated()) // features
        .field(11, FieldDef::text().repeated()) // native platforms
        .field(12, FieldDef::int()) // width px
        .field(13, FieldDef::int()) // height px
        .field(14, FieldDef::text().repeated()) // locales
        .field(15, FieldDef::text().repeated()) // GL extensions
}

fn build_checkin_request() -> Schema {
    Schema::new()
        .field(2, FieldDef::int()) // android id
        .field(3, FieldDef::text()) // digest
        .field(4, FieldDef::message(checkin()))
        .field(6, FieldDef::text()) // locale
        .field(7, FieldDef::int()) // logging id
        .field(9, FieldDef::text().repeated()) // mac addresses
        .field(10, FieldDef::text()) // meid
        .field(11, FieldDef::text().repeated()) // account cookies
        .field(12, FieldDef::text()) // time zone
        .field(14, FieldDef::int()) // version
        .field(15, FieldDef::text().repeated()) // ota certs
        .field(16, FieldDef::text()) // serial
        .field(17, FieldDef::text()) // esn
        .field(18, FieldDef::message(device_config()))
        .field(19, FieldDef::text().repeated()) // mac address types
        .field(20, FieldDef::int()) // fragment
        .field(21, FieldDef::text()) // user name
        .field(22, FieldDef::int()) // user serial number
}
