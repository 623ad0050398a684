//! The browser-facing route table.
//!
//! Adding a route means adding one `RouteSpec` here and listing it in
//! [`ROUTES`]; the router and pipeline pick it up from there.

use crate::proxy::route::{
    BinaryShape, Disposition, ErrorShape, FieldKind, FieldRule, IdentityPlacement, InboundKind,
    JsonShape, ResponseShape, RouteSpec, Service, Verb,
};

const PASSTHROUGH: ResponseShape = ResponseShape::Json(JsonShape::PASSTHROUGH);

const ADVICE_SHAPE: ResponseShape = ResponseShape::Json(JsonShape {
    renames: &[("response", "answer")],
    ensure_arrays: &["sources"],
    select: None,
});

const FILE_REQUIRED: &[FieldRule] = &[FieldRule::required("file", FieldKind::File)];

/// Shorthand for the common case: JSON in, JSON passthrough out, id in the body.
const fn json_route(
    name: &'static str,
    path: &'static str,
    service: Service,
    backend_path: &'static str,
    fields: &'static [FieldRule],
    message: &'static str,
) -> RouteSpec {
    RouteSpec {
        name,
        path,
        method: Verb::Post,
        service,
        backend_method: Verb::Post,
        backend_path,
        inbound: InboundKind::Json,
        fields,
        identity: IdentityPlacement::BodyField("user_id"),
        wrap_body: None,
        bearer: false,
        response: PASSTHROUGH,
        error: ErrorShape::message(message),
    }
}

/// Multipart upload forwarded as multipart with the id as a form field.
const fn upload_route(
    name: &'static str,
    path: &'static str,
    service: Service,
    backend_path: &'static str,
    fields: &'static [FieldRule],
    message: &'static str,
) -> RouteSpec {
    RouteSpec {
        name,
        path,
        method: Verb::Post,
        service,
        backend_method: Verb::Post,
        backend_path,
        inbound: InboundKind::Multipart,
        fields,
        identity: IdentityPlacement::FormField("user_id"),
        wrap_body: None,
        bearer: false,
        response: PASSTHROUGH,
        error: ErrorShape::message(message),
    }
}

/// Authenticated call keyed by the user id in the backend path.
const fn user_route(
    name: &'static str,
    path: &'static str,
    method: Verb,
    backend_path: &'static str,
    message: &'static str,
) -> RouteSpec {
    RouteSpec {
        name,
        path,
        method,
        service: Service::Expense,
        backend_method: method,
        backend_path,
        inbound: InboundKind::Empty,
        fields: &[],
        identity: IdentityPlacement::PathSegment,
        wrap_body: None,
        bearer: true,
        response: PASSTHROUGH,
        error: ErrorShape::message(message),
    }
}

// Expense service

pub const ASK: RouteSpec = json_route(
    "ask",
    "/api/ask",
    Service::Expense,
    "/ask-ai/",
    &[FieldRule::required("question", FieldKind::Text)],
    "Failed to get an answer",
);

pub const ASK_DOCUMENT: RouteSpec = json_route(
    "ask_document",
    "/api/ask-document",
    Service::Expense,
    "/api/ask-document",
    &[
        FieldRule::required("question", FieldKind::Text),
        FieldRule::required("document_data", FieldKind::Any),
    ],
    "Failed to answer document question",
);

pub const REPORT: RouteSpec = json_route(
    "report",
    "/api/report",
    Service::Expense,
    "/get-report/",
    &[],
    "Failed to generate report",
);

pub const GET_REPORT: RouteSpec = RouteSpec {
    name: "get_report",
    path: "/api/get-report",
    response: ResponseShape::Json(JsonShape {
        renames: &[],
        ensure_arrays: &[],
        select: Some(&["report"]),
    }),
    ..REPORT
};

pub const SETTINGS: RouteSpec = json_route(
    "settings",
    "/api/settings",
    Service::Expense,
    "/api/settings",
    &[
        FieldRule::required("salary", FieldKind::Number),
        FieldRule::required("limit", FieldKind::Number),
    ],
    "Failed to save settings",
);

pub const ANALYSIS: RouteSpec = user_route(
    "analysis",
    "/api/analysis",
    Verb::Get,
    "/api/analysis/{user_id}",
    "Failed to fetch analysis data",
);

pub const REWARDS: RouteSpec = user_route(
    "rewards",
    "/api/rewards",
    Verb::Get,
    "/api/settings/{user_id}",
    "Failed to fetch rewards data",
);

pub const REWARDS_CALCULATE: RouteSpec = user_route(
    "rewards_calculate",
    "/api/rewards/calculate",
    Verb::Post,
    "/api/rewards/calculate-sniper/{user_id}",
    "Failed to calculate rewards",
);

pub const REWARDS_REDEEM: RouteSpec = user_route(
    "rewards_redeem",
    "/api/rewards/redeem",
    Verb::Post,
    "/api/rewards/redeem/{user_id}",
    "Failed to redeem points",
);

pub const UPLOAD_RECEIPT: RouteSpec = upload_route(
    "upload_receipt",
    "/api/upload-receipt",
    Service::Expense,
    "/upload-receipt/",
    FILE_REQUIRED,
    "Failed to upload receipt",
);

// Documents service

pub const UPLOAD_DOCUMENT: RouteSpec = upload_route(
    "upload_document",
    "/api/upload-document",
    Service::Documents,
    "/process-document",
    FILE_REQUIRED,
    "Failed to process document",
);

pub const PROCESS_DOCUMENT: RouteSpec = RouteSpec {
    name: "process_document",
    path: "/api/process-document",
    ..UPLOAD_DOCUMENT
};

pub const UPLOAD_FILE_REPORT: RouteSpec = RouteSpec {
    name: "upload_file_report",
    path: "/api/upload-file-report",
    error: ErrorShape::message("Failed to upload file"),
    ..UPLOAD_DOCUMENT
};

pub const GENERATE_USER_REPORT: RouteSpec = upload_route(
    "generate_user_report",
    "/api/generate-user-report",
    Service::Documents,
    "/generate-user-financial-report",
    &[
        FieldRule::required("file", FieldKind::File),
        FieldRule::optional("data_type", FieldKind::Text).with_default("individual"),
    ],
    "Failed to generate user report",
);

pub const GENERATE_ORGANIZATION_REPORT: RouteSpec = json_route(
    "generate_organization_report",
    "/api/generate-organization-report",
    Service::Documents,
    "/generate-organization-financial-report",
    &[
        FieldRule::required("symbol", FieldKind::Text),
        FieldRule::optional("data_type", FieldKind::Text).with_default("organization"),
    ],
    "Failed to generate stock report",
);

pub const GET_ADVICE: RouteSpec = RouteSpec {
    response: ADVICE_SHAPE,
    ..json_route(
        "get_advice",
        "/api/get-advice",
        Service::Documents,
        "/get-advice",
        &[
            FieldRule::required("query", FieldKind::Text),
            FieldRule::optional("document_path", FieldKind::Text),
        ],
        "Failed to get financial advice",
    )
};

pub const QUERY_DOCUMENT: RouteSpec = RouteSpec {
    name: "query_document",
    path: "/api/query-document",
    fields: &[
        FieldRule::required("query", FieldKind::Text),
        FieldRule::required("filename", FieldKind::Text).renamed("document_path"),
    ],
    ..GET_ADVICE
};

pub const UPDATE_PREFERENCES: RouteSpec = RouteSpec {
    wrap_body: Some("preferences"),
    ..json_route(
        "update_preferences",
        "/api/update-preferences",
        Service::Documents,
        "/update-preferences",
        &[],
        "Failed to update preferences",
    )
};

pub const VIEW_REPORTS: RouteSpec = RouteSpec {
    name: "view_reports",
    path: "/api/view-reports",
    method: Verb::Get,
    service: Service::Documents,
    backend_method: Verb::Get,
    backend_path: "/view-reports",
    inbound: InboundKind::Query,
    fields: &[],
    identity: IdentityPlacement::QueryParam("userId"),
    wrap_body: None,
    bearer: false,
    response: PASSTHROUGH,
    error: ErrorShape {
        message: "Failed to fetch reports",
        fallback_arrays: &["reports"],
        not_found: None,
    },
};

pub const USER_FILES: RouteSpec = RouteSpec {
    name: "user_files",
    path: "/api/user-files",
    backend_path: "/user-files",
    identity: IdentityPlacement::QueryParam("user_id"),
    error: ErrorShape {
        message: "Failed to fetch user files",
        fallback_arrays: &["files"],
        not_found: None,
    },
    ..VIEW_REPORTS
};

pub const REPORT_FILE: RouteSpec = RouteSpec {
    name: "report_file",
    path: "/api/reports/{filename}",
    method: Verb::Get,
    service: Service::Documents,
    backend_method: Verb::Get,
    backend_path: "/reports/{filename}",
    inbound: InboundKind::Empty,
    fields: &[],
    identity: IdentityPlacement::GateOnly,
    wrap_body: None,
    bearer: false,
    response: ResponseShape::Binary(BinaryShape {
        default_content_type: "application/pdf",
        disposition: Disposition::Attachment,
    }),
    error: ErrorShape {
        message: "Failed to fetch report",
        fallback_arrays: &[],
        not_found: Some("Report not found"),
    },
};

pub const CHART_FILE: RouteSpec = RouteSpec {
    name: "chart_file",
    path: "/api/reports/charts/{filename}",
    backend_path: "/reports/charts/{filename}",
    response: ResponseShape::Binary(BinaryShape {
        default_content_type: "image/png",
        disposition: Disposition::Inline,
    }),
    error: ErrorShape {
        message: "Failed to fetch chart",
        fallback_arrays: &[],
        not_found: Some("Chart not found"),
    },
    ..REPORT_FILE
};

/// Every proxied route, in registration order.
pub static ROUTES: &[RouteSpec] = &[
    ASK,
    ASK_DOCUMENT,
    REPORT,
    GET_REPORT,
    SETTINGS,
    ANALYSIS,
    REWARDS,
    REWARDS_CALCULATE,
    REWARDS_REDEEM,
    UPLOAD_RECEIPT,
    UPLOAD_DOCUMENT,
    PROCESS_DOCUMENT,
    UPLOAD_FILE_REPORT,
    GENERATE_USER_REPORT,
    GENERATE_ORGANIZATION_REPORT,
    GET_ADVICE,
    QUERY_DOCUMENT,
    UPDATE_PREFERENCES,
    VIEW_REPORTS,
    USER_FILES,
    REPORT_FILE,
    CHART_FILE,
];

/// Look up a route by its log name.
pub fn by_name(name: &str) -> Option<&'static RouteSpec> {
    ROUTES.iter().find(|r| r.name == name)
}
