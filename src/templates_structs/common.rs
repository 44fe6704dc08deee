use askama::Template;

use super::PageContext;

pub struct Feature {
    pub title: &'static str,
    pub desc: &'static str,
}

pub struct ProcessStep {
    pub number: &'static str,
    pub title: &'static str,
    pub desc: &'static str,
}

pub static FEATURES: [Feature; 5] = [
    Feature { title: "Direct Manufacturer", desc: "Factory-direct pricing with no middleman markups." },
    Feature { title: "All Merchandise", desc: "Tees, Longsleeves, Hoodies, Crewnecks, Hats, Pants, Shorts, Jerseys, etc." },
    Feature { title: "Custom Embroidery", desc: "Premium stitching for letters, crests, and personalized gear." },
    Feature { title: "Bulk Orders", desc: "Scalable production for entire chapters or national events." },
    Feature { title: "Student Founded", desc: "Founded at Indiana University. Built by students, for students." },
];

pub static PROCESS: [ProcessStep; 3] = [
    ProcessStep { number: "01", title: "Design", desc: "Use your design or collaborate with us on a custom design." },
    ProcessStep { number: "02", title: "Produce", desc: "Manufactured in-house using premium materials." },
    ProcessStep { number: "03", title: "Deliver", desc: "We handle all logistics and ship directly to your location." },
];

#[derive(Template)]
#[template(path = "home.html")]
pub struct HomeTemplate {
    pub ctx: PageContext,
    pub tagline: &'static str,
    pub features: &'static [Feature],
    pub steps: &'static [ProcessStep],
}

#[derive(Template)]
#[template(path = "errors/404.html")]
pub struct NotFoundTemplate {
    pub ctx: PageContext,
}
