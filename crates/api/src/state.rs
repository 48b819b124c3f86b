use std::sync::Arc;

use syllabus_core::ports::Repositories;
use syllabus_core::services::{CategoryService, CourseService, ReviewService, UserService};

/// Services shared by every handler, wired over one repository set.
#[derive(Clone)]
pub struct AppState {
    pub categories: CategoryService<dyn Repositories>,
    pub courses: CourseService<dyn Repositories>,
    pub reviews: ReviewService<dyn Repositories>,
    pub users: UserService<dyn Repositories>,
}

impl AppState {
    pub fn new(repositories: Arc<dyn Repositories>) -> Self {
        let categories = CategoryService::new(Arc::clone(&repositories));
        let courses = CourseService::new(Arc::clone(&repositories), categories.clone());
        let users = UserService::new(Arc::clone(&repositories));
        let reviews = ReviewService::new(repositories, users.clone(), courses.clone());

        Self {
            categories,
            courses,
            reviews,
            users,
        }
    }
}
