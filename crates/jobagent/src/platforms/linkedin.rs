//! LinkedIn Easy Apply strategy table.

use super::{
    ControlMatcher, CredentialField, FlowSelectors, ListingSelectors, LoginScript, LoginStep,
    PlatformSpec, SearchTemplate,
};

pub static LINKEDIN: PlatformSpec = PlatformSpec {
    id: "linkedin",
    name: "LinkedIn",
    origin: "https://www.linkedin.com",
    login: LoginScript {
        url: "https://www.linkedin.com/login",
        steps: &[
            LoginStep::Fill {
                selectors: &["input#username", "input[name='session_key']"],
                value: CredentialField::Email,
            },
            LoginStep::Fill {
                selectors: &["input#password", "input[name='session_password']"],
                value: CredentialField::Password,
            },
            LoginStep::Click {
                control: ControlMatcher {
                    css: &["button[type='submit']"],
                    text_tags: &["button"],
                    texts: &["sign in"],
                },
            },
        ],
        success_url_fragment: Some("/feed"),
        challenge_url_markers: &["/checkpoint", "/challenge", "captcha"],
    },
    search: SearchTemplate {
        base: "https://www.linkedin.com/jobs/search/",
        keyword_param: "keywords",
        location_param: "location",
        // f_AL restricts results to Easy Apply; DD sorts by most recent.
        fixed_params: &[("f_AL", "true"), ("sortBy", "DD")],
        regional_bases: &[],
    },
    listing: ListingSelectors {
        card_wait: ".jobs-search-results__list-item, .job-card-container",
        card_cascade: &[".jobs-search-results__list-item", ".job-card-container"],
        title: &[".job-card-list__title", ".job-card-container__link"],
        company: &[
            ".job-card-container__primary-description",
            ".job-card-container__company-name",
            ".artdeco-entity-lockup__subtitle",
        ],
        location: &[
            ".job-card-container__metadata-wrapper",
            ".artdeco-entity-lockup__caption",
        ],
        link: &[
            "a.job-card-list__title",
            "a.job-card-container__link",
            "a[href*='/jobs/view/']",
            "a",
        ],
        easy_apply_badge: &[],
        fallback_item: "main li",
        job_link: &["a[href*='/jobs/view/']"],
        next_page: ControlMatcher {
            css: &[
                "button[aria-label='View next page']",
                "button[aria-label='Next']",
            ],
            text_tags: &["button"],
            texts: &["next"],
        },
    },
    flow: FlowSelectors {
        open_apply: ControlMatcher {
            css: &["button.jobs-apply-button"],
            text_tags: &["button"],
            texts: &["easy apply"],
        },
        external_markers: &[],
        confirmation: ControlMatcher {
            css: &[],
            text_tags: &["h2", "h3"],
            texts: &["application was sent", "application sent"],
        },
        submit: ControlMatcher {
            css: &["button[aria-label='Submit application']"],
            text_tags: &["button"],
            texts: &["submit application"],
        },
        review: ControlMatcher {
            css: &["button[aria-label='Review your application']"],
            text_tags: &["button"],
            texts: &["review"],
        },
        next: ControlMatcher {
            css: &["button[aria-label='Continue to next step']"],
            text_tags: &["button"],
            texts: &["next", "continue"],
        },
        dismiss: ControlMatcher {
            css: &["button[aria-label='Dismiss']"],
            text_tags: &["button"],
            texts: &["done", "discard"],
        },
        text_inputs: &[
            ".jobs-easy-apply-modal input[type='text']",
            ".jobs-easy-apply-modal input[type='tel']",
            ".jobs-easy-apply-modal input[type='email']",
            ".jobs-easy-apply-modal input[type='number']",
            ".jobs-easy-apply-modal textarea",
        ],
        selects: ".jobs-easy-apply-modal select",
        choice_groups: &[
            ".jobs-easy-apply-modal fieldset",
            ".jobs-easy-apply-modal [role='radiogroup']",
        ],
        group_label: &["legend", "span.fb-dash-form-element__label", "span"],
        file_input: "input[type='file']",
    },
    job_url_pattern: r"/jobs/view/(\d+)",
    quick_apply_filtered: true,
};
