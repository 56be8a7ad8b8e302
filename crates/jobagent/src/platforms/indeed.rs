//! Indeed Apply strategy table.

use super::{
    ControlMatcher, CredentialField, FlowSelectors, ListingSelectors, LoginScript, LoginStep,
    PlatformSpec, SearchTemplate,
};

pub static INDEED: PlatformSpec = PlatformSpec {
    id: "indeed",
    name: "Indeed",
    origin: "https://www.indeed.com",
    login: LoginScript {
        url: "https://secure.indeed.com/auth",
        // Two-phase form: email first, password appears after continue.
        steps: &[
            LoginStep::Fill {
                selectors: &[
                    "input[type='email']",
                    "input[name='__email']",
                    "input[name='email']",
                ],
                value: CredentialField::Email,
            },
            LoginStep::Click {
                control: ControlMatcher {
                    css: &["button[type='submit']"],
                    text_tags: &["button"],
                    texts: &["continue", "log in"],
                },
            },
            LoginStep::Fill {
                selectors: &["input[type='password']", "input[name='__password']"],
                value: CredentialField::Password,
            },
            LoginStep::Click {
                control: ControlMatcher {
                    css: &["button[type='submit']"],
                    text_tags: &["button"],
                    texts: &["log in", "sign in"],
                },
            },
        ],
        success_url_fragment: None,
        challenge_url_markers: &["captcha", "verification", "challenge"],
    },
    search: SearchTemplate {
        base: "https://www.indeed.com/jobs",
        keyword_param: "q",
        location_param: "l",
        fixed_params: &[("sort", "date"), ("fromage", "7")],
        regional_bases: &[
            ("canada", "https://ca.indeed.com/jobs"),
            (", on", "https://ca.indeed.com/jobs"),
        ],
    },
    listing: ListingSelectors {
        card_wait: ".job_seen_beacon, .jobsearch-ResultsList > li, .resultContent",
        card_cascade: &[".job_seen_beacon", ".resultContent"],
        title: &["h2.jobTitle a", "h2.jobTitle span", ".jcs-JobTitle"],
        company: &["[data-testid='company-name']", ".companyName", ".company"],
        location: &["[data-testid='text-location']", ".companyLocation", ".location"],
        link: &["a[href*='/viewjob']", "a[href*='jk=']", "h2.jobTitle a"],
        easy_apply_badge: &[".ialbl", ".indeed-apply-widget"],
        fallback_item: "main li",
        job_link: &["a[href*='/viewjob']", "a[href*='jk=']"],
        next_page: ControlMatcher {
            css: &[
                "a[data-testid='pagination-page-next']",
                "a[aria-label='Next Page']",
            ],
            text_tags: &["a"],
            texts: &["next"],
        },
    },
    flow: FlowSelectors {
        open_apply: ControlMatcher {
            css: &[
                "#indeedApplyButton",
                ".indeed-apply-button",
                "button[id*='apply']",
            ],
            text_tags: &["button", "a"],
            texts: &["apply now", "apply on company site"],
        },
        external_markers: &["company site"],
        confirmation: ControlMatcher {
            css: &[],
            text_tags: &["h1", "h2"],
            texts: &[
                "application submitted",
                "application has been submitted",
                "you applied",
                "application sent",
            ],
        },
        submit: ControlMatcher {
            css: &[],
            text_tags: &["button"],
            texts: &[
                "submit your application",
                "submit application",
                "submit",
            ],
        },
        review: ControlMatcher {
            css: &[],
            text_tags: &["button"],
            texts: &["review your application"],
        },
        next: ControlMatcher {
            css: &[],
            text_tags: &["button"],
            texts: &["continue", "next"],
        },
        dismiss: ControlMatcher {
            css: &["button[aria-label='Close']"],
            text_tags: &["button"],
            texts: &["close", "exit"],
        },
        text_inputs: &[
            "input[type='text']",
            "input[type='tel']",
            "input[type='email']",
            "input[type='number']",
            "textarea",
        ],
        selects: "select",
        choice_groups: &["fieldset", "[role='radiogroup']", "[role='group']"],
        group_label: &["legend", "label.ia-BaseLabelWrapper", "span"],
        file_input: "input[type='file']",
    },
    job_url_pattern: r"jk=([A-Za-z0-9]+)",
    quick_apply_filtered: false,
};
